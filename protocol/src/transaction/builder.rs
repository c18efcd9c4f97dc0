//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] enforces a disciplined construction flow:
//! set the required fields, call `.build()`, and get back an unsigned
//! [`Transaction`] with a deterministic ID derived from its contents.
//!
//! The builder does not sign — that happens in [`super::signing`]. This
//! separation keeps construction testable without key material.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::types::{Amount, EvidenceMessage, TransactionPayload};
use crate::crypto::hash::double_sha256;
use crate::crypto::{Address, PublicKey, Signature};

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A signed (or unsigned, pre-`sign_transaction`) consensus-core transaction.
///
/// The `id` field is the double-SHA-256 hash of the canonical serialization
/// of all fields *except* `signature`. This means the ID is stable across
/// signing — it can be computed before the transaction is signed and will
/// not change afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID: `hex(double_sha256(signable_bytes))`.
    pub id: String,

    /// Protocol version at the time of creation.
    pub version: u16,

    /// Sender's address.
    pub sender: Address,

    /// Monotonically increasing per-sender sequence number. Prevents replay
    /// and enforces transaction ordering.
    pub nonce: u64,

    /// Fee paid to the proposer, used for mempool priority ordering.
    pub fee: u64,

    /// Unix timestamp in milliseconds when the transaction was created.
    pub timestamp: u64,

    /// The operation this transaction represents.
    pub payload: TransactionPayload,

    /// Hex-encoded sender public key. Embedded so validators can verify the
    /// signature without a separate key lookup. Set during signing.
    pub sender_public_key: Option<String>,

    /// Ed25519 signature over [`Transaction::signable_bytes`], hex-encoded.
    /// `None` for unsigned transactions fresh from the builder.
    pub signature: Option<String>,
}

impl Transaction {
    /// Returns the canonical byte representation used for signing and ID
    /// computation.
    ///
    /// Uses `bincode` rather than JSON so field ordering is deterministic
    /// and compact. Excluded fields: `id`, `sender_public_key`, `signature`.
    pub fn signable_bytes(&self) -> Vec<u8> {
        #[derive(Serialize)]
        struct Signable<'a> {
            version: u16,
            sender: &'a Address,
            nonce: u64,
            fee: u64,
            timestamp: u64,
            payload: &'a TransactionPayload,
        }
        let signable = Signable {
            version: self.version,
            sender: &self.sender,
            nonce: self.nonce,
            fee: self.fee,
            timestamp: self.timestamp,
            payload: &self.payload,
        };
        bincode::serialize(&signable).expect("transaction fields are always serializable")
    }

    /// Computes the transaction ID from the current field values.
    ///
    /// `id = hex(double_sha256(signable_bytes))`. Deterministic and
    /// independent of signature state.
    pub fn compute_id(&self) -> String {
        let hash = double_sha256(&self.signable_bytes());
        hex::encode(hash)
    }

    /// Returns `true` if the transaction carries a signature.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Returns the transaction ID as a hex string (convenience alias).
    pub fn id_hex(&self) -> String {
        self.id.clone()
    }

    /// Parses the embedded sender public key, if present.
    pub fn sender_public_key(&self) -> Option<PublicKey> {
        self.sender_public_key
            .as_deref()
            .and_then(|s| PublicKey::from_hex(s).ok())
    }

    /// Parses the embedded signature, if present.
    pub fn parsed_signature(&self) -> Option<Signature> {
        self.signature.as_deref().and_then(|s| Signature::from_hex(s).ok())
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for constructing unsigned [`Transaction`] instances.
///
/// # Usage
///
/// ```rust,no_run
/// use quorum_protocol::crypto::Keypair;
/// use quorum_protocol::transaction::TransactionBuilder;
///
/// let kp = Keypair::generate();
/// let tx = TransactionBuilder::stake(kp.address(), 1_000)
///     .nonce(1)
///     .build();
/// ```
///
/// The builder sets `version` to the current protocol version and
/// `timestamp` to the current UTC time by default. Both can be overridden.
pub struct TransactionBuilder {
    version: u16,
    sender: Address,
    payload: TransactionPayload,
    fee: u64,
    nonce: u64,
    timestamp: Option<u64>,
}

impl TransactionBuilder {
    fn new(sender: Address, payload: TransactionPayload) -> Self {
        Self {
            version: 1,
            sender,
            payload,
            fee: 0,
            nonce: 0,
            timestamp: None,
        }
    }

    /// A value transfer from `sender` to `receiver`.
    pub fn transfer(sender: Address, receiver: Address, amount: Amount) -> Self {
        Self::new(sender, TransactionPayload::Transfer { receiver, amount })
    }

    /// A staking transaction: bond `amount` from `sender`.
    pub fn stake(sender: Address, amount: Amount) -> Self {
        Self::new(sender, TransactionPayload::Stake { amount })
    }

    /// An unstaking transaction: schedule release of `amount` for `sender`.
    pub fn unstake(sender: Address, amount: Amount) -> Self {
        Self::new(sender, TransactionPayload::Unstake { amount })
    }

    /// An evidence transaction naming `byzantine_player` as having signed
    /// two conflicting messages, submitted by `reporter`.
    pub fn evidence(
        reporter: Address,
        byzantine_player: Address,
        msg1: EvidenceMessage,
        msg2: EvidenceMessage,
    ) -> Self {
        Self::new(
            reporter,
            TransactionPayload::Evidence {
                byzantine_player,
                msg1,
                msg2,
            },
        )
    }

    /// Sets the protocol version. Only needed for testing version upgrades.
    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    /// Sets the transaction fee.
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Sets the sender's nonce (sequence number).
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets the timestamp explicitly (Unix milliseconds).
    ///
    /// If not called, `build()` uses the current UTC time.
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Builds the final unsigned transaction, computing its canonical ID.
    pub fn build(self) -> Transaction {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp_millis() as u64);

        let mut tx = Transaction {
            id: String::new(),
            version: self.version,
            sender: self.sender,
            nonce: self.nonce,
            fee: self.fee,
            timestamp,
            payload: self.payload,
            sender_public_key: None,
            signature: None,
        };
        tx.id = tx.compute_id();
        tx
    }
}
