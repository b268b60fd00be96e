//! Ethereum Attestation Service contract bindings

use alloy::sol;

sol! {
    /// Single attestation payload
    #[derive(Debug, Default)]
    struct AttestationRequestData {
        address recipient;
        uint64 expirationTime;   // 0 = never expires
        bool revocable;
        bytes32 refUID;          // parent attestation
        bytes data;              // schema-encoded payload
        uint256 value;
    }

    #[derive(Debug, Default)]
    struct AttestationRequest {
        bytes32 schema;
        AttestationRequestData data;
    }

    /// Several attestations under one schema
    #[derive(Debug, Default)]
    struct MultiAttestationRequest {
        bytes32 schema;
        AttestationRequestData[] data;
    }

    #[derive(Debug, Default)]
    struct RevocationRequestData {
        bytes32 uid;
        uint256 value;
    }

    #[derive(Debug, Default)]
    struct RevocationRequest {
        bytes32 schema;
        RevocationRequestData data;
    }

    /// Several revocations under one schema
    #[derive(Debug, Default)]
    struct MultiRevocationRequest {
        bytes32 schema;
        RevocationRequestData[] data;
    }

    /// EAS contract interface
    #[sol(rpc)]
    interface IEAS {
        /// Attest to a schema, returning the new attestation uid
        function attest(AttestationRequest calldata request) external payable returns (bytes32);

        /// Attest to several schemas in one transaction
        function multiAttest(MultiAttestationRequest[] calldata multiRequests) external payable returns (bytes32[] memory);

        /// Revoke an attestation
        function revoke(RevocationRequest calldata request) external payable;

        /// Revoke several attestations in one transaction
        function multiRevoke(MultiRevocationRequest[] calldata multiRequests) external payable;

        event Attested(address indexed recipient, address indexed attester, bytes32 uid, bytes32 indexed schemaUID);

        event Revoked(address indexed recipient, address indexed attester, bytes32 uid, bytes32 indexed schemaUID);
    }
}
