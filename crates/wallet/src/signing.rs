//! Transaction building and ed25519 signing

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokend_types::NetworkParams;
use tracing::debug;

use crate::SigningError;

/// Signing account derived from a wallet secret seed
#[derive(Clone)]
pub struct Account {
    signing_key: SigningKey,
}

impl Account {
    /// Create an account from a hex-encoded 32 byte seed
    pub fn from_secret_seed(seed_hex: &str) -> Result<Self, SigningError> {
        let bytes = hex::decode(seed_hex.trim())
            .map_err(|e| SigningError::InvalidSeed(format!("hex decode error: {}", e)))?;
        Self::from_seed_bytes(&bytes)
    }

    pub fn from_seed_bytes(seed: &[u8]) -> Result<Self, SigningError> {
        let seed: [u8; 32] = seed
            .try_into()
            .map_err(|_| SigningError::InvalidSeed(format!("expected 32 bytes, got {}", seed.len())))?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Upper-case hex of the public key
    pub fn account_id(&self) -> String {
        hex::encode_upper(self.public_key())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify_signature(&self.public_key(), message, signature)
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("account_id", &self.account_id())
            .finish_non_exhaustive()
    }
}

pub fn verify_signature(public_key: &[u8; 32], message: &[u8], signature: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    key.verify(message, &signature).is_ok()
}

/// Anything able to sign a transaction hash
pub trait TransactionSigner: Send + Sync {
    fn public_key(&self) -> [u8; 32];

    fn sign(&self, payload: &[u8]) -> Vec<u8>;
}

impl TransactionSigner for Account {
    fn public_key(&self) -> [u8; 32] {
        Account::public_key(self)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        Account::sign(self, payload).to_vec()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fee {
    pub fixed: u64,
    pub percent: u64,
}

impl Fee {
    pub fn zero() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFeeData {
    pub source_fee: Fee,
    pub destination_fee: Fee,
    pub source_pays_for_dest: bool,
}

impl PaymentFeeData {
    pub fn zero() -> Self {
        Self {
            source_fee: Fee::zero(),
            destination_fee: Fee::zero(),
            source_pays_for_dest: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOp {
    pub source_balance_id: String,
    pub destination_account_id: String,
    /// Amount in on-chain precision
    pub amount: u64,
    pub fee_data: PaymentFeeData,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Payment(PaymentOp),
}

// ═══════════════════════════════════════════════════════════════════════════
// TRANSACTION
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    /// Hex SHA-256 of the network passphrase
    pub network_id: String,
    pub source_account_id: String,
    pub salt: u64,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedSignature {
    /// Hex of the last 4 bytes of the signer's public key
    pub hint: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub body: TransactionBody,
    pub signatures: Vec<DecoratedSignature>,
}

impl Transaction {
    pub fn new(
        network_params: &NetworkParams,
        source_account_id: impl Into<String>,
        operations: Vec<Operation>,
        salt: u64,
    ) -> Self {
        Self {
            body: TransactionBody {
                network_id: hex::encode(Sha256::digest(network_params.passphrase.as_bytes())),
                source_account_id: source_account_id.into(),
                salt,
                operations,
            },
            signatures: Vec::new(),
        }
    }

    /// Hash the signatures commit to
    pub fn hash(&self) -> Result<[u8; 32], SigningError> {
        let encoded =
            serde_json::to_vec(&self.body).map_err(|e| SigningError::Encoding(e.to_string()))?;
        Ok(Sha256::digest(encoded).into())
    }

    pub fn add_signature(&mut self, signer: &dyn TransactionSigner) -> Result<(), SigningError> {
        let hash = self.hash()?;
        let public_key = signer.public_key();
        self.signatures.push(DecoratedSignature {
            hint: hex::encode(&public_key[28..]),
            signature: hex::encode(signer.sign(&hash)),
        });
        Ok(())
    }

    /// Base64 of the JSON-encoded signed transaction
    pub fn envelope(&self) -> Result<String, SigningError> {
        let encoded =
            serde_json::to_vec(self).map_err(|e| SigningError::Encoding(e.to_string()))?;
        Ok(BASE64.encode(encoded))
    }

    pub fn from_envelope(envelope: &str) -> Result<Self, SigningError> {
        let bytes = BASE64
            .decode(envelope)
            .map_err(|e| SigningError::Encoding(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| SigningError::Encoding(e.to_string()))
    }
}

pub struct TxManager;

impl TxManager {
    /// Build a single-operation transaction and sign it with `signer`
    pub fn create_signed_transaction(
        network_params: &NetworkParams,
        source_account_id: &str,
        signer: &dyn TransactionSigner,
        operation: Operation,
    ) -> Result<Transaction, SigningError> {
        let salt = chrono::Utc::now()
            .timestamp_nanos_opt()
            .map(i64::unsigned_abs)
            .unwrap_or_default();

        let mut transaction =
            Transaction::new(network_params, source_account_id, vec![operation], salt);
        transaction.add_signature(signer)?;

        debug!(source = %source_account_id, salt, "signed transaction");
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn payment() -> Operation {
        Operation::Payment(PaymentOp {
            source_balance_id: "balance-1".into(),
            destination_account_id: "owner".into(),
            amount: 1_500_000,
            fee_data: PaymentFeeData::zero(),
            subject: String::new(),
            reference: String::new(),
        })
    }

    #[test]
    fn test_account_from_seed() {
        let account = Account::from_secret_seed(SEED).unwrap();
        assert_eq!(account.account_id().len(), 64);
        assert_eq!(
            account.account_id(),
            Account::from_secret_seed(SEED).unwrap().account_id()
        );

        assert!(Account::from_secret_seed("zz").is_err());
        assert!(matches!(
            Account::from_secret_seed("0011"),
            Err(SigningError::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_sign_and_verify() {
        let account = Account::from_secret_seed(SEED).unwrap();
        let signature = account.sign(b"message");

        assert!(account.verify(b"message", &signature));
        assert!(!account.verify(b"other", &signature));
    }

    #[test]
    fn test_signed_transaction_verifies() {
        let account = Account::from_secret_seed(SEED).unwrap();
        let params = NetworkParams::new("TokenD Test Network", 6);

        let tx =
            TxManager::create_signed_transaction(&params, &account.account_id(), &account, payment())
                .unwrap();

        assert_eq!(tx.signatures.len(), 1);
        let signature = hex::decode(&tx.signatures[0].signature).unwrap();
        assert!(account.verify(&tx.hash().unwrap(), &signature));
        assert_eq!(tx.signatures[0].hint, hex::encode(&account.public_key()[28..]));
    }

    #[test]
    fn test_envelope_decodes_back() {
        let account = Account::from_secret_seed(SEED).unwrap();
        let params = NetworkParams::new("TokenD Test Network", 6);
        let tx = TxManager::create_signed_transaction(&params, "sender", &account, payment())
            .unwrap();

        let decoded = Transaction::from_envelope(&tx.envelope().unwrap()).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_network_id_depends_on_passphrase() {
        let a = Transaction::new(&NetworkParams::new("A", 6), "s", vec![], 1);
        let b = Transaction::new(&NetworkParams::new("B", 6), "s", vec![], 1);
        assert_ne!(a.hash().unwrap(), b.hash().unwrap());
    }
}
