//! # RSS Client Core
//!
//! Client-side engine for the Refresh Secret Sharing (RSS) protocol used by
//! threshold-signature wallets. The user holds one share of a 2-of-2 master
//! secret; this crate cooperates with a committee of storage servers to
//! proactively refresh the server-held sub-sharing and re-encrypt the user's
//! resulting share under long-term factor keys, without ever reconstructing
//! the master secret.
//!
//! ## Architecture
//!
//! - **Curve adapter** ([`curve`]): one interface over secp256k1 and
//!   ed25519 — scalar field, generator, point arithmetic, affine hex
//!   encoding
//! - **Polynomial kit** ([`poly`]): Shamir polynomials, Lagrange
//!   coefficients, dot products over the selected scalar field
//! - **Hybrid encryption** ([`ecies`]): ECIES share wrapping, pinned to
//!   secp256k1 regardless of the TSS curve
//! - **Commitment aggregator** ([`commitments`]): Feldman commitment sums
//!   and the algebraic checks binding a refresh to the TSS public key
//! - **Protocol engine** ([`protocol`]): the two-round refresh/import
//!   driver and share recovery
//! - **Transport** ([`transport`]): the `{get, post}` endpoint capability,
//!   over HTTP or the in-process mock committee
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rss_client_core::{RssClient, RssClientConfig, RefreshOptions, recover};
//!
//! let client = RssClient::new(RssClientConfig {
//!     tss_pub_key,
//!     server_endpoints,
//!     server_threshold: 3,
//!     server_pubkeys,
//!     key_type: KeyType::Secp256k1,
//!     temp_key: None,
//! })?;
//!
//! let responses = client.refresh(RefreshOptions {
//!     old_label, new_label, sigs, dkg_new_pub,
//!     input_share, input_index: 2,
//!     target_indexes: vec![2, 3],
//!     selected_servers: vec![1, 2, 3],
//!     factor_pubs,
//! }).await?;
//!
//! // Later, with the factor private key:
//! let tss_share = recover(&recover_options)?;
//! ```
//!
//! ## Security Model
//!
//! Every Round 1 response is verified against the aggregated Feldman
//! commitments before any share is accepted: the aggregate must reconstruct
//! the known TSS public key, the server sub-sharing must join the master
//! sharing at x = 1, and the summed user share must match the master
//! commitments at the fixed user index. Round 2 tolerates individual server
//! failures down to the reconstruction threshold.

pub mod commitments;
pub mod curve;
pub mod ecies;
pub mod error;
pub mod poly;
pub mod protocol;
pub mod transport;
pub mod types;

pub use curve::{HexPoint, KeyType};
pub use ecies::EncryptedMessage;
pub use error::{Error, Result};
pub use protocol::{recover, RssClient, RssClientConfig};
pub use transport::{Endpoint, Fault, HttpEndpoint, MockServer};
pub use types::{
    AuthToken, ImportOptions, RecoverOptions, RefreshOptions, RefreshResponse, ServersInfo,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed master-polynomial index of the user's share
///
/// A protocol constant: every commitment-evaluation check uses this exact
/// index, so it must not be made configurable.
pub const USER_SHARE_INDEX: u64 = 99;
