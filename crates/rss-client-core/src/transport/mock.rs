//! In-process mock server
//!
//! Implements the server side of the RSS protocol behind the same
//! `{get, post}` capability set a remote server exposes, for deterministic
//! tests and local simulation. State (ECIES private key, labeled TSS
//! shares, nonce counters) lives behind a lock; handlers are pure functions
//! of the request plus that state.
//!
//! Scenario tests can arm one [`Fault`] per server instance to exercise the
//! client's failure paths without intercepting traffic.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use k256::elliptic_curve::{bigint::U256, ops::Reduce};
use k256::{ProjectivePoint, Scalar};
use parking_lot::RwLock;
use rand::rngs::OsRng;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::ServerTransport;
use crate::commitments::{evaluate_commitments, parse_commitments};
use crate::curve::{Curve, CurveScalar, Ed25519, HexPoint, KeyType, Secp256k1};
use crate::ecies;
use crate::error::{Error, Result};
use crate::poly;
use crate::protocol::messages::{
    RssRound1Request, RssRound1Response, RssRound1ResponseData, RssRound2Request,
    RssRound2Response, RssRound2ResponseData, ServerSet, ROUND_1_NAME, ROUND_2_NAME,
};
use crate::protocol::refresh::deal_contribution;
use crate::protocol::scalar_from_plaintext;
use crate::types::AuthToken;

/// Deterministic misbehavior injected into one mock server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    /// Behave honestly
    #[default]
    None,
    /// Round 1: corrupt the first master-polynomial commitment
    TamperMasterCommit,
    /// Round 1: corrupt the first server-polynomial commitment
    TamperServerCommit,
    /// Round 1: flip a ciphertext byte of the user encryption
    TamperUserEnc,
    /// Round 1: encrypt a user share off by one
    TamperUserShare,
    /// Round 2: refuse to answer
    FailRound2,
}

#[derive(Default)]
struct MockState {
    private_key: Option<Scalar>,
    tss_shares: HashMap<String, String>,
    nonces: HashMap<String, u64>,
    fault: Fault,
}

/// One in-process committee member
pub struct MockServer {
    state: RwLock<MockState>,
}

#[derive(Deserialize)]
struct SetPrivateKeyBody {
    private_key: String,
}

#[derive(Deserialize)]
struct SetTssShareBody {
    label: String,
    tss_share: String,
}

#[derive(Deserialize)]
struct SetNonceBody {
    label: String,
    nonce: u64,
}

impl MockServer {
    /// Create a mock server with empty state
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MockState::default()),
        }
    }

    /// Arm a fault for subsequent requests
    pub fn set_fault(&self, fault: Fault) {
        self.state.write().fault = fault;
    }

    /// Label signature verification hook.
    // TODO: verify `sigs` over `label` once the session token format is
    // finalized; pass-through until then.
    fn verify_label_sig(&self, _auth: &AuthToken) -> Result<()> {
        Ok(())
    }

    fn private_key_bytes(&self) -> Result<[u8; 32]> {
        let state = self.state.read();
        let scalar = state
            .private_key
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("private key not set".into()))?;
        Ok(scalar.to_bytes().into())
    }

    // ========================================================================
    // Admin endpoints
    // ========================================================================

    fn set_private_key(&self, body: SetPrivateKeyBody) -> Result<Value> {
        let bytes = crate::protocol::decode_secp_scalar_hex(&body.private_key)?;
        let scalar = <Scalar as Reduce<U256>>::reduce_bytes(&bytes.into());
        if scalar == Scalar::ZERO {
            return Err(Error::InvalidInput("private key must be nonzero".into()));
        }
        self.state.write().private_key = Some(scalar);
        Ok(json!({ "ok": true }))
    }

    fn public_key(&self) -> Result<Value> {
        let scalar = {
            let state = self.state.read();
            state
                .private_key
                .ok_or_else(|| Error::InvalidInput("private key not set".into()))?
        };
        let point = ProjectivePoint::GENERATOR * scalar;
        Ok(json!({ "public_key": Secp256k1::to_hex_point(&point) }))
    }

    fn set_tss_share(&self, body: SetTssShareBody) -> Result<Value> {
        self.state.write().tss_shares.insert(body.label, body.tss_share);
        Ok(json!({ "ok": true }))
    }

    fn set_tss_nonce(&self, body: SetNonceBody) -> Result<Value> {
        self.state.write().nonces.insert(body.label, body.nonce);
        Ok(json!({ "ok": true }))
    }

    fn get_tss_nonce(&self, query: &str) -> Result<Value> {
        let label = query_param(query, "label")
            .ok_or_else(|| Error::InvalidInput("label query parameter required".into()))?;
        let nonce = self.state.read().nonces.get(&label).copied().unwrap_or(0);
        Ok(json!({ "nonce": nonce }))
    }

    // ========================================================================
    // Round 1
    // ========================================================================

    fn handle_round_1(&self, request: RssRound1Request) -> Result<RssRound1Response> {
        if request.round_name != ROUND_1_NAME {
            return Err(Error::InvalidInput(format!(
                "unexpected round name: {}",
                request.round_name
            )));
        }
        self.verify_label_sig(&request.auth)?;

        let info = match request.server_set {
            ServerSet::Old => request
                .old_servers_info
                .as_ref()
                .ok_or_else(|| Error::InvalidInput("old_servers_info required for the old set".into()))?,
            ServerSet::New => &request.new_servers_info,
        };
        let mut seen = HashSet::new();
        for &index in &info.selected {
            if index == 0 || index as usize > info.pubkeys.len() {
                return Err(Error::InvalidInput(format!(
                    "selected index {index} out of range"
                )));
            }
            if !seen.insert(index) {
                return Err(Error::InvalidInput(format!("duplicate selected index {index}")));
            }
        }
        if !info.selected.contains(&request.server_index) {
            return Err(Error::InvalidInput(format!(
                "server {} is not in the selected set",
                request.server_index
            )));
        }
        for &target in &request.target_index {
            if !(2..=3).contains(&target) {
                return Err(Error::InvalidInput(format!(
                    "target index must be 2 or 3, got {target}"
                )));
            }
        }
        if request.server_set == ServerSet::Old {
            let old_index = request
                .old_user_share_index
                .ok_or_else(|| Error::InvalidInput("old_user_share_index required for the old set".into()))?;
            if !(2..=3).contains(&old_index) {
                return Err(Error::InvalidInput(format!(
                    "old user share index must be 2 or 3, got {old_index}"
                )));
            }
        }

        let share_hex = {
            let state = self.state.read();
            state.tss_shares.get(&request.auth.label).cloned()
        }
        .ok_or_else(|| {
            Error::InvalidInput(format!("no TSS share under label {}", request.auth.label))
        })?;
        let fault = self.state.read().fault;

        debug!(
            server_index = request.server_index,
            server_set = ?request.server_set,
            "Mock Round 1"
        );
        match request.key_type {
            KeyType::Secp256k1 => self.round_1_inner::<Secp256k1>(&request, &share_hex, fault),
            KeyType::Ed25519 => self.round_1_inner::<Ed25519>(&request, &share_hex, fault),
        }
    }

    fn round_1_inner<C: Curve>(
        &self,
        request: &RssRound1Request,
        share_hex: &str,
        fault: Fault,
    ) -> Result<RssRound1Response> {
        let share = C::Scalar::from_hex(share_hex)?;
        let threshold = request.new_servers_info.threshold as usize;
        let user_pubkey = request.user_temp_pubkey.to_uncompressed_bytes()?;
        // Target encryptions always address the incoming committee
        let server_pubkeys: Vec<[u8; 65]> = request
            .new_servers_info
            .pubkeys
            .iter()
            .map(HexPoint::to_uncompressed_bytes)
            .collect::<Result<_>>()?;
        let selected: Vec<u64> = match request.server_set {
            ServerSet::Old => request
                .old_servers_info
                .as_ref()
                .map(|info| info.selected.iter().map(|&i| u64::from(i)).collect())
                .unwrap_or_default(),
            ServerSet::New => request
                .new_servers_info
                .selected
                .iter()
                .map(|&i| u64::from(i))
                .collect(),
        };
        let server_index = u64::from(request.server_index);

        // This server's share of the labeled DKG key, lifted to 0 over the
        // selected committee; the old set additionally lifts the 2-of-2
        // server position (x = 1) to 0 against the user's outgoing index
        let committee = poly::lagrange_coefficient::<C>(&selected, server_index, 0)?;
        let lift = match (request.server_set, request.old_user_share_index) {
            (ServerSet::Old, Some(old_index)) => {
                Some(poly::lagrange_coefficient::<C>(&[1, u64::from(old_index)], 1, 0)?)
            }
            _ => None,
        };

        let mut rng = OsRng;
        let mut data = Vec::with_capacity(request.target_index.len());
        for &target in &request.target_index {
            let target = u64::from(target);
            let coefficient = match request.server_set {
                ServerSet::Old => {
                    let reshare = poly::lagrange_coefficient::<C>(&[0, 1], 0, target)?;
                    match lift {
                        Some(lift) => committee * lift * reshare,
                        None => committee * reshare,
                    }
                }
                ServerSet::New => {
                    let reshare = poly::lagrange_coefficient::<C>(&[0, 1], 1, target)?;
                    committee * reshare
                }
            };
            let (mut contribution, user_share) = deal_contribution::<C, _>(
                &mut rng,
                coefficient * share,
                threshold,
                &user_pubkey,
                &server_pubkeys,
            )?;
            apply_round_1_fault::<C>(fault, &mut contribution, user_share, &user_pubkey)?;
            data.push(contribution);
        }
        Ok(RssRound1Response {
            target_index: request.target_index.clone(),
            data,
        })
    }

    // ========================================================================
    // Round 2
    // ========================================================================

    fn handle_round_2(&self, request: RssRound2Request) -> Result<RssRound2Response> {
        if request.round_name != ROUND_2_NAME {
            return Err(Error::InvalidInput(format!(
                "unexpected round name: {}",
                request.round_name
            )));
        }
        if self.state.read().fault == Fault::FailRound2 {
            return Err(Error::Transport("round 2 disabled by fault injection".into()));
        }
        if request.server_index == 0 {
            return Err(Error::InvalidInput("server indices are 1-based".into()));
        }
        if request.data.len() != request.target_index.len() {
            return Err(Error::InvalidInput(
                "one data entry per target index required".into(),
            ));
        }
        let private_key = self.private_key_bytes()?;

        debug!(server_index = request.server_index, "Mock Round 2");
        match request.key_type {
            KeyType::Secp256k1 => self.round_2_inner::<Secp256k1>(&request, &private_key),
            KeyType::Ed25519 => self.round_2_inner::<Ed25519>(&request, &private_key),
        }
    }

    fn round_2_inner<C: Curve>(
        &self,
        request: &RssRound2Request,
        private_key: &[u8; 32],
    ) -> Result<RssRound2Response> {
        let server_index = u64::from(request.server_index);
        let mut out = Vec::with_capacity(request.data.len());
        for (entry, &target) in request.data.iter().zip(&request.target_index) {
            let target = u64::from(target);
            let master = parse_commitments::<C>(&entry.master_commits, 2, "master_commits")?;
            let server = parse_commitments::<C>(
                &entry.server_commits,
                entry.server_commits.len().max(1),
                "server_commits",
            )?;
            if master[0] + master[1] != server[0] {
                return Err(Error::ServerMasterCommitMismatch { target });
            }

            let mut sum = C::Scalar::zero();
            for enc in &entry.server_encs {
                let plaintext = ecies::decrypt(private_key, enc)?;
                sum = sum + scalar_from_plaintext::<C>(&plaintext)?;
            }
            if C::generator() * sum != evaluate_commitments::<C>(&server, server_index) {
                return Err(Error::VerificationFailed(format!(
                    "summed share does not match server commitments at index {server_index}"
                )));
            }

            let encs = entry
                .factor_pubkeys
                .iter()
                .map(|factor| {
                    let pubkey = factor.to_uncompressed_bytes()?;
                    ecies::encrypt(&pubkey, &sum.to_be_bytes())
                })
                .collect::<Result<Vec<_>>>()?;
            out.push(RssRound2ResponseData { encs });
        }
        Ok(RssRound2Response {
            target_index: request.target_index.clone(),
            data: out,
        })
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServerTransport for MockServer {
    async fn get(&self, path: &str) -> Result<Value> {
        let (route, query) = path.split_once('?').unwrap_or((path, ""));
        match route {
            "/public_key" => self.public_key(),
            "/get_tss_nonce" => self.get_tss_nonce(query),
            other => Err(Error::Transport(format!("unknown path: {other}"))),
        }
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        match path {
            "/rss_round_1" => {
                let request: RssRound1Request = serde_json::from_value(body)?;
                Ok(serde_json::to_value(self.handle_round_1(request)?)?)
            }
            "/rss_round_2" => {
                let request: RssRound2Request = serde_json::from_value(body)?;
                Ok(serde_json::to_value(self.handle_round_2(request)?)?)
            }
            "/private_key" => self.set_private_key(serde_json::from_value(body)?),
            "/tss_share" => self.set_tss_share(serde_json::from_value(body)?),
            "/set_tss_nonce" => self.set_tss_nonce(serde_json::from_value(body)?),
            other => Err(Error::Transport(format!("unknown path: {other}"))),
        }
    }
}

fn apply_round_1_fault<C: Curve>(
    fault: Fault,
    contribution: &mut RssRound1ResponseData,
    user_share: C::Scalar,
    user_pubkey: &[u8; 65],
) -> Result<()> {
    match fault {
        Fault::None | Fault::FailRound2 => {}
        Fault::TamperMasterCommit => {
            contribution.master_poly_commits[0] =
                shift_point::<C>(&contribution.master_poly_commits[0])?;
        }
        Fault::TamperServerCommit => {
            contribution.server_poly_commits[0] =
                shift_point::<C>(&contribution.server_poly_commits[0])?;
        }
        Fault::TamperUserEnc => {
            let mut raw = hex::decode(&contribution.target_encryptions.user_enc.ciphertext)
                .map_err(|e| Error::Decrypt(e.to_string()))?;
            raw[0] ^= 0x01;
            contribution.target_encryptions.user_enc.ciphertext = hex::encode(raw);
        }
        Fault::TamperUserShare => {
            let wrong = user_share + C::Scalar::one();
            contribution.target_encryptions.user_enc =
                ecies::encrypt(user_pubkey, &wrong.to_be_bytes())?;
        }
    }
    Ok(())
}

/// Replace a committed point with itself plus the generator
fn shift_point<C: Curve>(hex_point: &HexPoint) -> Result<HexPoint> {
    let point = C::from_hex_point(hex_point)?;
    Ok(C::to_hex_point(&(point + C::generator())))
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}
