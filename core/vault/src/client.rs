//! Vault client: encrypted CRUD over the ledger.
//!
//! Every operation derives the key and access tag from the passphrase
//! afresh, encodes the record address, and talks to the ledger through a
//! [`LedgerGateway`]. Writes submit one transaction each and wait for it to
//! confirm, bounded by the configured confirmation timeout.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::config::VaultConfig;
use crate::wallet::WalletAccount;
use chainvault_common::{Error, Result, SiteAddress};
use chainvault_crypto::{decrypt, encrypt, DerivedKeys, KeyDeriver, VaultSalt};
use chainvault_ledger::{
    create_default_registry, Address, CollectionInfo, LedgerGateway, RecordKey, RevertReason,
    Submission, TxHash, TxReceipt, TxStatus, VaultCall, WirePayload,
};

/// Progress of a single write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxState {
    /// Deriving keys, encrypting and encoding the call.
    Building,
    /// Accepted by the ledger, awaiting confirmation.
    Submitted(TxHash),
    /// Included and executed.
    Confirmed(TxReceipt),
    /// Refused by the contract.
    Reverted(RevertReason),
    /// Transport failure or confirmation timeout.
    Failed,
}

impl TxState {
    fn trace(&self, method: &'static str, address: &SiteAddress) {
        match self {
            TxState::Building => debug!(method, address = %address, "Building transaction"),
            TxState::Submitted(hash) => {
                debug!(method, address = %address, tx = %hash, "Transaction submitted")
            }
            TxState::Confirmed(receipt) => info!(
                method,
                address = %address,
                tx = %receipt.hash,
                block = ?receipt.block_number,
                "Transaction confirmed"
            ),
            TxState::Reverted(reason) => {
                warn!(method, address = %address, reason = %reason, "Transaction reverted")
            }
            TxState::Failed => warn!(method, address = %address, "Transaction failed"),
        }
    }
}

/// Map a contract revert onto the client error taxonomy.
fn revert_error(reason: RevertReason) -> Error {
    match reason {
        RevertReason::AccessDenied => Error::AuthorizationOrNotFound,
        other => Error::TransactionReverted(other.to_string()),
    }
}

/// Client for an encrypted vault on the ledger.
pub struct VaultClient {
    gateway: Arc<dyn LedgerGateway>,
    wallet: Option<WalletAccount>,
    deriver: KeyDeriver,
    scope: Address,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl VaultClient {
    /// Create a client over an existing gateway.
    ///
    /// # Errors
    /// - Malformed contract or account address in `config`
    pub fn new(config: &VaultConfig, gateway: Arc<dyn LedgerGateway>) -> Result<Self> {
        Ok(Self {
            gateway,
            wallet: config.wallet()?,
            deriver: KeyDeriver::new(config.kdf_params.clone()),
            scope: config.contract()?,
            confirmation_timeout: config.confirmation_timeout(),
            poll_interval: config.poll_interval(),
        })
    }

    /// Validate `config` and resolve its gateway from the default registry.
    pub fn from_config(config: &VaultConfig) -> Result<Self> {
        config.validate()?;
        let registry = create_default_registry();
        let gateway = registry.resolve(&config.gateway, &config.gateway_config())?;
        Self::new(config, gateway)
    }

    /// Replace the signing account.
    pub fn with_wallet(mut self, wallet: Option<WalletAccount>) -> Self {
        self.wallet = wallet;
        self
    }

    /// Replace the confirmation timeout.
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Replace the receipt poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Configured signing account, if any.
    pub fn account(&self) -> Option<&WalletAccount> {
        self.wallet.as_ref()
    }

    /// Gateway in use.
    pub fn gateway(&self) -> &Arc<dyn LedgerGateway> {
        &self.gateway
    }

    /// Name and symbol of the token collection. Needs no wallet.
    pub async fn collection_info(&self) -> Result<CollectionInfo> {
        self.gateway.collection_info().await
    }

    /// Store a new secret at `address`.
    ///
    /// # Preconditions
    /// - The wallet holds the token named by `address`
    /// - No record exists at `address`
    ///
    /// # Postconditions
    /// - A confirmed record bound to the passphrase's access tag
    ///
    /// # Errors
    /// - `WalletUnavailable` without a signing account
    /// - `InputTooLong` if url or username exceed the field width (nothing is submitted)
    /// - `TransactionReverted` if the contract refuses
    /// - `ConfirmationTimeout` if the transaction does not confirm in time
    pub async fn create(
        &self,
        address: &SiteAddress,
        passphrase: &[u8],
        plaintext: &str,
    ) -> Result<TxReceipt> {
        let from = self.sender()?;
        let key = RecordKey::encode(address)?;
        TxState::Building.trace("storePassword", address);

        let keys = self.derive(address, passphrase).await?;
        let payload = WirePayload::encode(&encrypt(plaintext.as_bytes(), &keys.key));

        let call = VaultCall::Create {
            key,
            tag: keys.tag,
            payload,
        };
        self.execute(from, address, call).await
    }

    /// Fetch and decrypt the secret at `address`.
    ///
    /// # Errors
    /// - `WalletUnavailable` without a signing account
    /// - `AuthorizationOrNotFound` if the tag does not match or nothing is stored
    /// - `DecryptionFailure` if the stored payload does not decrypt under the key
    pub async fn read(&self, address: &SiteAddress, passphrase: &[u8]) -> Result<Zeroizing<String>> {
        let from = self.sender()?;
        let key = RecordKey::encode(address)?;
        let keys = self.derive(address, passphrase).await?;

        let wire = self.gateway.read(from, &key, &keys.tag).await?;
        let payload = wire.decode().map_err(|_| Error::DecryptionFailure)?;
        let plaintext = decrypt(&payload, &keys.key)?;

        debug!(address = %address, "Record read");
        match String::from_utf8(plaintext) {
            Ok(text) => Ok(Zeroizing::new(text)),
            Err(e) => {
                e.into_bytes().zeroize();
                Err(Error::DecryptionFailure)
            }
        }
    }

    /// Replace the secret at `address` with a fresh encryption.
    ///
    /// # Errors
    /// - `WalletUnavailable` without a signing account
    /// - `AuthorizationOrNotFound` if the tag does not match or nothing is stored
    /// - `TransactionReverted` for any other refusal, and for a write that
    ///   passed simulation but reverted when mined without a reason (for
    ///   example the record was rotated or deleted in between)
    /// - `ConfirmationTimeout` if the transaction does not confirm in time
    pub async fn update(
        &self,
        address: &SiteAddress,
        passphrase: &[u8],
        plaintext: &str,
    ) -> Result<TxReceipt> {
        let from = self.sender()?;
        let key = RecordKey::encode(address)?;
        TxState::Building.trace("updatePassword", address);

        let keys = self.derive(address, passphrase).await?;
        let payload = WirePayload::encode(&encrypt(plaintext.as_bytes(), &keys.key));

        let call = VaultCall::Update {
            key,
            tag: keys.tag,
            payload,
        };
        self.execute(from, address, call).await
    }

    /// Remove the secret at `address`.
    ///
    /// # Errors
    /// Same as [`VaultClient::update`].
    pub async fn delete(&self, address: &SiteAddress, passphrase: &[u8]) -> Result<TxReceipt> {
        let from = self.sender()?;
        let key = RecordKey::encode(address)?;
        TxState::Building.trace("deletePassword", address);

        let keys = self.derive(address, passphrase).await?;
        let call = VaultCall::Delete { key, tag: keys.tag };
        self.execute(from, address, call).await
    }

    fn sender(&self) -> Result<Address> {
        self.wallet
            .as_ref()
            .map(WalletAccount::address)
            .ok_or(Error::WalletUnavailable)
    }

    /// Run Argon2id off the async worker threads.
    async fn derive(&self, address: &SiteAddress, passphrase: &[u8]) -> Result<DerivedKeys> {
        let deriver = self.deriver.clone();
        let salt = VaultSalt::for_token(self.scope.as_slice(), address.token());
        let passphrase = Zeroizing::new(passphrase.to_vec());

        tokio::task::spawn_blocking(move || deriver.derive(&passphrase, &salt))
            .await
            .map_err(|e| Error::Crypto(format!("Key derivation task failed: {}", e)))?
    }

    async fn execute(
        &self,
        from: Address,
        address: &SiteAddress,
        call: VaultCall,
    ) -> Result<TxReceipt> {
        let method = call.method();

        let submission = match self.gateway.submit(from, &call).await {
            Ok(submission) => submission,
            Err(e) => {
                TxState::Failed.trace(method, address);
                return Err(e);
            }
        };

        let hash = match submission {
            Submission::Pending(hash) => hash,
            Submission::Rejected(reason) => {
                TxState::Reverted(reason.clone()).trace(method, address);
                return Err(revert_error(reason));
            }
        };
        TxState::Submitted(hash).trace(method, address);

        let receipt =
            match tokio::time::timeout(self.confirmation_timeout, self.await_receipt(&hash)).await {
                Ok(Ok(receipt)) => receipt,
                Ok(Err(e)) => {
                    TxState::Failed.trace(method, address);
                    return Err(e);
                }
                Err(_) => {
                    TxState::Failed.trace(method, address);
                    return Err(Error::ConfirmationTimeout(self.confirmation_timeout));
                }
            };

        match receipt.status.clone() {
            TxStatus::Confirmed => {
                TxState::Confirmed(receipt.clone()).trace(method, address);
                Ok(receipt)
            }
            TxStatus::Reverted(reason) => {
                TxState::Reverted(reason.clone()).trace(method, address);
                Err(revert_error(reason))
            }
        }
    }

    async fn await_receipt(&self, hash: &TxHash) -> Result<TxReceipt> {
        loop {
            if let Some(receipt) = self.gateway.receipt(hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainvault_common::TokenId;
    use chainvault_crypto::{KdfParams, SymmetricKey};
    use chainvault_ledger::MemoryLedger;
    use std::str::FromStr;

    const OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const STRANGER: &str = "0x70997970C51812dc3A64C0B48CeF3C0F55CeBA8C";

    fn test_config(account: Option<&str>) -> VaultConfig {
        VaultConfig {
            gateway: "memory".to_string(),
            account: account.map(str::to_string),
            kdf_params: KdfParams::testing(),
            confirmation_timeout_secs: 5,
            poll_interval_ms: 10,
            ..VaultConfig::default()
        }
    }

    fn setup() -> (Arc<MemoryLedger>, VaultClient, TokenId) {
        let ledger = Arc::new(MemoryLedger::new());
        let token = ledger.mint(Address::from_str(OWNER).unwrap()).unwrap();
        let client = VaultClient::new(&test_config(Some(OWNER)), ledger.clone()).unwrap();
        (ledger, client, token)
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let (_ledger, client, token) = setup();
        let address = SiteAddress::new(token, "example.com", "alice");

        let receipt = client.create(&address, b"corp-key", "S3cr3t!").await.unwrap();
        assert_eq!(receipt.status, TxStatus::Confirmed);

        let secret = client.read(&address, b"corp-key").await.unwrap();
        assert_eq!(secret.as_str(), "S3cr3t!");
    }

    #[tokio::test]
    async fn test_wallet_unavailable() {
        let ledger = Arc::new(MemoryLedger::new());
        let client = VaultClient::new(&test_config(None), ledger.clone()).unwrap();
        let address = SiteAddress::new(TokenId::new(1), "example.com", "alice");

        assert!(matches!(
            client.create(&address, b"corp-key", "S3cr3t!").await,
            Err(Error::WalletUnavailable)
        ));
        assert!(matches!(
            client.read(&address, b"corp-key").await,
            Err(Error::WalletUnavailable)
        ));
        assert!(matches!(
            client.delete(&address, b"corp-key").await,
            Err(Error::WalletUnavailable)
        ));

        // Metadata needs no wallet
        let info = client.collection_info().await.unwrap();
        assert_eq!(info.symbol, "PWmD");
    }

    #[tokio::test]
    async fn test_too_long_submits_nothing() {
        let (ledger, client, token) = setup();
        let address = SiteAddress::new(token, "a".repeat(32), "alice");

        let result = client.create(&address, b"corp-key", "S3cr3t!").await;
        assert!(matches!(
            result,
            Err(Error::InputTooLong { field: "url", len: 32, max: 31 })
        ));
        assert_eq!(ledger.record_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wrong_passphrase_denied() {
        let (_ledger, client, token) = setup();
        let address = SiteAddress::new(token, "example.com", "alice");
        client.create(&address, b"corp-key", "S3cr3t!").await.unwrap();

        assert!(matches!(
            client.read(&address, b"wrong-key").await,
            Err(Error::AuthorizationOrNotFound)
        ));
        assert!(matches!(
            client.update(&address, b"wrong-key", "hijack").await,
            Err(Error::AuthorizationOrNotFound)
        ));
        assert!(matches!(
            client.delete(&address, b"wrong-key").await,
            Err(Error::AuthorizationOrNotFound)
        ));
    }

    #[tokio::test]
    async fn test_non_owner_reverted() {
        let (ledger, _client, token) = setup();
        let stranger = VaultClient::new(&test_config(Some(STRANGER)), ledger.clone()).unwrap();
        let address = SiteAddress::new(token, "example.com", "alice");

        let result = stranger.create(&address, b"corp-key", "S3cr3t!").await;
        assert!(matches!(result, Err(Error::TransactionReverted(_))));
        assert_eq!(ledger.record_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_create_reverted() {
        let (_ledger, client, token) = setup();
        let address = SiteAddress::new(token, "example.com", "alice");
        client.create(&address, b"corp-key", "S3cr3t!").await.unwrap();

        let result = client.create(&address, b"other-key", "again").await;
        assert!(matches!(result, Err(Error::TransactionReverted(_))));
        assert_eq!(
            client.read(&address, b"corp-key").await.unwrap().as_str(),
            "S3cr3t!"
        );
    }

    #[tokio::test]
    async fn test_confirmation_timeout() {
        let (ledger, client, token) = setup();
        let client = client
            .with_confirmation_timeout(Duration::from_millis(50))
            .with_poll_interval(Duration::from_millis(5));
        ledger.stall_confirmations(true);

        let address = SiteAddress::new(token, "example.com", "alice");
        let result = client.create(&address, b"corp-key", "S3cr3t!").await;
        match result {
            Err(e @ Error::ConfirmationTimeout(_)) => assert!(e.is_retryable()),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_decryption_failure() {
        let (ledger, client, token) = setup();
        let address = SiteAddress::new(token, "example.com", "alice");

        // Correct tag, payload sealed under an unrelated key
        let salt = VaultSalt::for_token(Address::ZERO.as_slice(), token);
        let keys = KeyDeriver::new(KdfParams::testing())
            .derive(b"corp-key", &salt)
            .unwrap();
        let foreign = SymmetricKey::from_bytes([7u8; 32]);
        let call = VaultCall::Create {
            key: RecordKey::encode(&address).unwrap(),
            tag: keys.tag,
            payload: WirePayload::encode(&encrypt(b"S3cr3t!", &foreign)),
        };
        let owner = Address::from_str(OWNER).unwrap();
        assert!(matches!(
            ledger.submit(owner, &call).await.unwrap(),
            Submission::Pending(_)
        ));

        assert!(matches!(
            client.read(&address, b"corp-key").await,
            Err(Error::DecryptionFailure)
        ));
    }

    #[test]
    fn test_revert_mapping() {
        assert!(matches!(
            revert_error(RevertReason::AccessDenied),
            Error::AuthorizationOrNotFound
        ));
        assert!(matches!(
            revert_error(RevertReason::NotTokenOwner),
            Error::TransactionReverted(_)
        ));
    }
}
