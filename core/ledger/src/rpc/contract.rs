//! ABI bindings for the vault contract.

use alloy_core::primitives::{Bytes, FixedBytes, U256};
use alloy_core::sol;
use alloy_core::sol_types::{SolCall, SolValue};

use crate::codec::{decode_binary, encode_binary, RecordKey, WirePayload};
use crate::gateway::VaultCall;
use chainvault_common::{Error, Result};
use chainvault_crypto::AccessTag;

sol! {
    function storePassword(uint256 tokenId, bytes32 keyHash, bytes32 url, bytes32 username, bytes encryptedPassword, bytes iv) external;
    function getPassword(uint256 tokenId, bytes32 keyHash, bytes32 url, bytes32 username) external view returns (bytes ciphertext, bytes iv);
    function updatePassword(uint256 tokenId, bytes32 keyHash, bytes32 url, bytes32 username, bytes encryptedPassword, bytes iv) external;
    function deletePassword(uint256 tokenId, bytes32 keyHash, bytes32 url, bytes32 username) external;
    function name() external view returns (string);
    function symbol() external view returns (string);
}

fn payload_bytes(payload: &WirePayload) -> Result<(Bytes, Bytes)> {
    Ok((
        Bytes::from(decode_binary(&payload.ciphertext)?),
        Bytes::from(decode_binary(&payload.iv)?),
    ))
}

/// ABI-encode calldata for a record-mutating call.
pub fn encode_call(call: &VaultCall) -> Result<Vec<u8>> {
    let data = match call {
        VaultCall::Create { key, tag, payload } => {
            let (ciphertext, iv) = payload_bytes(payload)?;
            storePasswordCall {
                tokenId: U256::from(key.token.value()),
                keyHash: FixedBytes::from(*tag.as_bytes()),
                url: FixedBytes::from(key.site.url),
                username: FixedBytes::from(key.site.user),
                encryptedPassword: ciphertext,
                iv,
            }
            .abi_encode()
        }
        VaultCall::Update { key, tag, payload } => {
            let (ciphertext, iv) = payload_bytes(payload)?;
            updatePasswordCall {
                tokenId: U256::from(key.token.value()),
                keyHash: FixedBytes::from(*tag.as_bytes()),
                url: FixedBytes::from(key.site.url),
                username: FixedBytes::from(key.site.user),
                encryptedPassword: ciphertext,
                iv,
            }
            .abi_encode()
        }
        VaultCall::Delete { key, tag } => deletePasswordCall {
            tokenId: U256::from(key.token.value()),
            keyHash: FixedBytes::from(*tag.as_bytes()),
            url: FixedBytes::from(key.site.url),
            username: FixedBytes::from(key.site.user),
        }
        .abi_encode(),
    };
    Ok(data)
}

/// ABI-encode calldata for `getPassword`.
pub fn encode_read(key: &RecordKey, tag: &AccessTag) -> Vec<u8> {
    getPasswordCall {
        tokenId: U256::from(key.token.value()),
        keyHash: FixedBytes::from(*tag.as_bytes()),
        url: FixedBytes::from(key.site.url),
        username: FixedBytes::from(key.site.user),
    }
    .abi_encode()
}

/// Decode `getPassword` return data.
pub fn decode_read(data: &[u8]) -> Result<WirePayload> {
    let ret = getPasswordCall::abi_decode_returns(data)
        .map_err(|e| Error::Serialization(format!("Malformed getPassword return: {}", e)))?;
    Ok(WirePayload {
        ciphertext: encode_binary(&ret.ciphertext),
        iv: encode_binary(&ret.iv),
    })
}

/// Calldata for `name()`.
pub fn encode_name() -> Vec<u8> {
    nameCall {}.abi_encode()
}

/// Calldata for `symbol()`.
pub fn encode_symbol() -> Vec<u8> {
    symbolCall {}.abi_encode()
}

/// Decode a single `string` return value.
pub fn decode_string(data: &[u8]) -> Result<String> {
    String::abi_decode(data)
        .map_err(|e| Error::Serialization(format!("Malformed string return: {}", e)))
}
