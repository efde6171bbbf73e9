//! Solidity interface of the certificate contract
//!
//! Events, calls and return values are encoded and decoded by
//! `alloy-sol-types`. Two event layouts exist for the deployed contract:
//! [`ICertificateRegistry`] emits `holderId` as plain event data, while
//! [`ICertificateRegistryHashed`] indexes it, so only its hash is logged.

use alloy_sol_types::{sol, SolCall};

use crate::error::DecodeError;

sol! {
    #![sol(all_derives)]

    /// Certificate registry with `holderId` in the event data
    interface ICertificateRegistry {
        event CertificateIssued(address indexed issuer, string holderId, string metadataURI);
        event CertificateRevoked(address indexed issuer, string holderId, string metadataURI);
        event IssuerAdded(address indexed issuer);
        event IssuerRemoved(address indexed issuer);

        function issueCertificate(string holderId, string metadataURI) external;
        function revokeCertificate(string holderId, uint256 index) external;
        function addIssuer(address issuer) external;
        function removeIssuer(address issuer) external;
        function owner() external view returns (address);
        function isIssuer(address account) external view returns (bool);
    }
}

sol! {
    #![sol(all_derives)]

    /// Certificate registry with `holderId` as an indexed topic
    interface ICertificateRegistryHashed {
        event CertificateIssued(address indexed issuer, string indexed holderId, string metadataURI);
        event CertificateRevoked(address indexed issuer, string indexed holderId, string metadataURI);
    }
}

pub use ICertificateRegistry::issueCertificateCall as IssueCall;

/// Selector and signature of every state-changing or view function
const FUNCTIONS: [([u8; 4], &str); 6] = [
    (
        ICertificateRegistry::issueCertificateCall::SELECTOR,
        ICertificateRegistry::issueCertificateCall::SIGNATURE,
    ),
    (
        ICertificateRegistry::revokeCertificateCall::SELECTOR,
        ICertificateRegistry::revokeCertificateCall::SIGNATURE,
    ),
    (
        ICertificateRegistry::addIssuerCall::SELECTOR,
        ICertificateRegistry::addIssuerCall::SIGNATURE,
    ),
    (
        ICertificateRegistry::removeIssuerCall::SELECTOR,
        ICertificateRegistry::removeIssuerCall::SIGNATURE,
    ),
    (
        ICertificateRegistry::ownerCall::SELECTOR,
        ICertificateRegistry::ownerCall::SIGNATURE,
    ),
    (
        ICertificateRegistry::isIssuerCall::SELECTOR,
        ICertificateRegistry::isIssuerCall::SIGNATURE,
    ),
];

/// Name of a contract function, or the hex selector when it is unknown
pub fn function_name(selector: [u8; 4]) -> String {
    FUNCTIONS
        .iter()
        .find(|(known, _)| *known == selector)
        .and_then(|(_, signature)| signature.split('(').next())
        .map(str::to_string)
        .unwrap_or_else(|| format!("0x{}", hex::encode(selector)))
}

/// Decode transaction input as an `issueCertificate` call.
///
/// Fails with [`DecodeError::UnexpectedFunction`] when the selector belongs
/// to any other function.
pub fn decode_issue_call(input: &[u8]) -> Result<IssueCall, DecodeError> {
    let selector: [u8; 4] = input
        .get(..4)
        .and_then(|s| s.try_into().ok())
        .ok_or(DecodeError::MissingSelector(input.len()))?;

    if selector != IssueCall::SELECTOR {
        return Err(DecodeError::UnexpectedFunction(function_name(selector)));
    }
    Ok(IssueCall::abi_decode(input, true)?)
}
