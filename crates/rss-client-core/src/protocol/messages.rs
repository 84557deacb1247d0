//! RSS protocol wire messages
//!
//! JSON bodies exchanged with the server committee. Field names follow the
//! wire contract; everything point- or scalar-valued is hex.

use serde::{Deserialize, Serialize};

use crate::curve::{HexPoint, KeyType};
use crate::ecies::EncryptedMessage;
use crate::types::{AuthToken, ServersInfo};

/// Round name carried in Round 1 bodies
pub const ROUND_1_NAME: &str = "rss_round_1";
/// Round name carried in Round 2 bodies
pub const ROUND_2_NAME: &str = "rss_round_2";

/// Which side of the refresh a Round 1 request addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerSet {
    /// The outgoing sharing (refresh only)
    Old,
    /// The incoming sharing
    New,
}

/// Round 1 request: ask one server for its co-dealer contribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssRound1Request {
    pub round_name: String,
    pub server_set: ServerSet,
    /// 1-based committee index of the receiving server
    pub server_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_servers_info: Option<ServersInfo>,
    pub new_servers_info: ServersInfo,
    /// Master-polynomial index of the user's outgoing share (refresh only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_user_share_index: Option<u32>,
    /// The client's ephemeral secp256k1 public key
    pub user_temp_pubkey: HexPoint,
    pub target_index: Vec<u32>,
    pub auth: AuthToken,
    pub key_type: KeyType,
}

/// The encrypted shares of one co-dealer contribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetEncryptions {
    /// Master polynomial evaluated at the fixed user index, to the temp key
    pub user_enc: EncryptedMessage,
    /// Server polynomial evaluated at 1..=N, to each server key
    pub server_encs: Vec<EncryptedMessage>,
}

/// One co-dealer contribution for one target index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssRound1ResponseData {
    /// Commitments to the degree-1 master polynomial
    pub master_poly_commits: Vec<HexPoint>,
    /// Commitments to the degree-(T-1) server polynomial
    pub server_poly_commits: Vec<HexPoint>,
    pub target_encryptions: TargetEncryptions,
}

/// Round 1 response: one data entry per requested target index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssRound1Response {
    pub target_index: Vec<u32>,
    pub data: Vec<RssRound1ResponseData>,
}

/// Round 2 payload for one target index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssRound2RequestData {
    /// Aggregated master commitments
    pub master_commits: Vec<HexPoint>,
    /// Aggregated server commitments
    pub server_commits: Vec<HexPoint>,
    /// This server's column of the co-dealer encryption matrix
    pub server_encs: Vec<EncryptedMessage>,
    /// Factor keys to re-encrypt the summed share to
    pub factor_pubkeys: Vec<HexPoint>,
}

/// Round 2 request: hand one server its share column and the factor keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssRound2Request {
    pub round_name: String,
    /// 1-based committee index of the receiving server
    pub server_index: u32,
    pub target_index: Vec<u32>,
    pub data: Vec<RssRound2RequestData>,
    pub key_type: KeyType,
}

/// Round 2 payload returned per target index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssRound2ResponseData {
    /// One encryption of the summed share per factor key, in request order
    pub encs: Vec<EncryptedMessage>,
}

/// Round 2 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssRound2Response {
    pub target_index: Vec<u32>,
    pub data: Vec<RssRound2ResponseData>,
}
