//! Public data model
//!
//! Options and outputs of the client engine, plus the committee description
//! shared with every server. Wire-level round bodies live in
//! [`crate::protocol::messages`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::curve::{HexPoint, KeyType};
use crate::ecies::EncryptedMessage;

/// Committee description shared with every server in Round 1
///
/// `pubkeys` are the N long-term secp256k1 server keys (ECIES layer),
/// `selected` holds distinct 1-based indices into that list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServersInfo {
    pub pubkeys: Vec<HexPoint>,
    pub threshold: u32,
    pub selected: Vec<u32>,
}

/// Opaque session authentication forwarded to servers with each Round 1 call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    /// Share label the servers look up their TSS share under
    pub label: String,
    /// Signatures over the label; verified server-side
    pub sigs: Vec<String>,
}

/// Options for [`crate::RssClient::refresh`]
#[derive(Clone)]
pub struct RefreshOptions {
    /// Label of the outgoing server-side sharing
    pub old_label: String,
    /// Label of the incoming server-side sharing
    pub new_label: String,
    /// Session signatures, forwarded opaquely
    pub sigs: Vec<String>,
    /// Public key of the new server-side DKG
    pub dkg_new_pub: HexPoint,
    /// The user's current TSS share (hex scalar of the TSS curve)
    pub input_share: String,
    /// Master-polynomial index the input share sits at (2 or 3)
    pub input_index: u32,
    /// Indices to re-share the secret to
    pub target_indexes: Vec<u32>,
    /// Distinct 1-based committee indices, exactly `threshold` of them
    pub selected_servers: Vec<u32>,
    /// One factor public key per target index
    pub factor_pubs: Vec<HexPoint>,
}

impl fmt::Debug for RefreshOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshOptions")
            .field("old_label", &self.old_label)
            .field("new_label", &self.new_label)
            .field("input_share", &"[REDACTED]")
            .field("input_index", &self.input_index)
            .field("target_indexes", &self.target_indexes)
            .field("selected_servers", &self.selected_servers)
            .field("factor_pubs", &self.factor_pubs)
            .finish()
    }
}

/// Options for [`crate::RssClient::import`]
#[derive(Clone)]
pub struct ImportOptions {
    /// Label of the incoming server-side sharing
    pub new_label: String,
    /// Session signatures, forwarded opaquely
    pub sigs: Vec<String>,
    /// Public key of the new server-side DKG
    pub dkg_new_pub: HexPoint,
    /// Externally generated secret to import (hex scalar of the TSS curve)
    pub import_key: String,
    /// Indices to share the secret to
    pub target_indexes: Vec<u32>,
    /// Distinct 1-based committee indices, exactly `threshold` of them
    pub selected_servers: Vec<u32>,
    /// One factor public key per target index
    pub factor_pubs: Vec<HexPoint>,
}

impl fmt::Debug for ImportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportOptions")
            .field("new_label", &self.new_label)
            .field("import_key", &"[REDACTED]")
            .field("target_indexes", &self.target_indexes)
            .field("selected_servers", &self.selected_servers)
            .field("factor_pubs", &self.factor_pubs)
            .finish()
    }
}

/// Per-target output of a refresh or import call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// The target index this entry re-shares to
    #[serde(rename = "targetIndex")]
    pub target_index: u32,
    /// The factor public key the shares below are encrypted to
    #[serde(rename = "factorPub")]
    pub factor_pub: HexPoint,
    /// One slot per committee member; `None` where Round 2 failed
    #[serde(rename = "serverFactorEncs")]
    pub server_factor_encs: Vec<Option<EncryptedMessage>>,
    /// The user's refreshed share, encrypted to the factor key
    #[serde(rename = "userFactorEnc")]
    pub user_factor_enc: EncryptedMessage,
}

/// Options for [`crate::protocol::recover`]
#[derive(Clone)]
pub struct RecoverOptions {
    /// Curve the recovered share lives on
    pub key_type: KeyType,
    /// Factor private key (hex secp256k1 scalar)
    pub factor_key: String,
    /// The user's factor-encrypted share
    pub user_enc: EncryptedMessage,
    /// Factor-encrypted server shares, sparse, one slot per committee member
    pub server_encs: Vec<Option<EncryptedMessage>>,
    /// Distinct 1-based committee indices to interpolate over
    pub selected_servers: Vec<u32>,
}

impl fmt::Debug for RecoverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoverOptions")
            .field("key_type", &self.key_type)
            .field("factor_key", &"[REDACTED]")
            .field("selected_servers", &self.selected_servers)
            .finish()
    }
}
