//! The refresh/import engine
//!
//! Drives both rounds of the protocol. Refresh gathers 2T co-dealer
//! contributions from the committee (T as the "old" set, T as the "new"
//! set) and adds the client's own as the (2T+1)-th; import skips the old
//! side, leaving T+1 co-dealers. Round 1 is fail-fast: any commitment or
//! share inconsistency aborts the call. Round 2 is best-effort per server,
//! bounded below by the availability threshold.

use std::collections::HashSet;

use futures::future;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::messages::{
    RssRound1Request, RssRound1Response, RssRound1ResponseData, RssRound2Request,
    RssRound2RequestData, RssRound2Response, ServerSet, TargetEncryptions, ROUND_1_NAME,
    ROUND_2_NAME,
};
use super::{scalar_from_plaintext, RssClient};
use crate::commitments::{evaluate_commitments, parse_commitments, sum_commitments, verify_aggregate};
use crate::curve::{Curve, CurveScalar, HexPoint};
use crate::ecies;
use crate::error::{Error, Result};
use crate::poly;
use crate::types::{AuthToken, ImportOptions, RefreshOptions, RefreshResponse, ServersInfo};
use crate::USER_SHARE_INDEX;

/// Which variant of the protocol a call runs
#[derive(Debug, Clone)]
pub(crate) enum Mode {
    Refresh(RefreshOptions),
    Import(ImportOptions),
}

impl Mode {
    fn new_label(&self) -> &str {
        match self {
            Mode::Refresh(options) => &options.new_label,
            Mode::Import(options) => &options.new_label,
        }
    }

    fn sigs(&self) -> &[String] {
        match self {
            Mode::Refresh(options) => &options.sigs,
            Mode::Import(options) => &options.sigs,
        }
    }

    fn dkg_new_pub(&self) -> &HexPoint {
        match self {
            Mode::Refresh(options) => &options.dkg_new_pub,
            Mode::Import(options) => &options.dkg_new_pub,
        }
    }

    /// The secret the client contributes: the current share, or the import key
    fn input_share_hex(&self) -> &str {
        match self {
            Mode::Refresh(options) => &options.input_share,
            Mode::Import(options) => &options.import_key,
        }
    }

    fn target_indexes(&self) -> &[u32] {
        match self {
            Mode::Refresh(options) => &options.target_indexes,
            Mode::Import(options) => &options.target_indexes,
        }
    }

    fn selected_servers(&self) -> &[u32] {
        match self {
            Mode::Refresh(options) => &options.selected_servers,
            Mode::Import(options) => &options.selected_servers,
        }
    }

    fn factor_pubs(&self) -> &[HexPoint] {
        match self {
            Mode::Refresh(options) => &options.factor_pubs,
            Mode::Import(options) => &options.factor_pubs,
        }
    }

    /// `(old_label, input_index)` for refresh, `None` for import
    fn old_side(&self) -> Option<(&str, u32)> {
        match self {
            Mode::Refresh(options) => Some((&options.old_label, options.input_index)),
            Mode::Import(_) => None,
        }
    }
}

pub(crate) async fn run<C: Curve>(client: &RssClient, mode: Mode) -> Result<Vec<RefreshResponse>> {
    let config = &client.config;
    let node_count = config.server_pubkeys.len();
    let threshold = config.server_threshold as usize;
    let targets: Vec<u32> = mode.target_indexes().to_vec();
    let factor_pubs: Vec<HexPoint> = mode.factor_pubs().to_vec();

    validate_options(&mode, node_count, threshold)?;

    let tss_pub = C::from_hex_point(&config.tss_pub_key)?;
    let dkg_new_pub = C::from_hex_point(mode.dkg_new_pub())?;
    let input_share = C::Scalar::from_hex(mode.input_share_hex())?;
    let factor_pub_bytes: Vec<[u8; 65]> = factor_pubs
        .iter()
        .map(HexPoint::to_uncompressed_bytes)
        .collect::<Result<_>>()?;
    let server_pub_bytes: Vec<[u8; 65]> = config
        .server_pubkeys
        .iter()
        .map(HexPoint::to_uncompressed_bytes)
        .collect::<Result<_>>()?;
    let temp_pub_bytes = client.temp_public_key.to_uncompressed_bytes()?;

    // ============ Round 1: committee fan-out ============
    let servers_info = ServersInfo {
        pubkeys: config.server_pubkeys.clone(),
        threshold: config.server_threshold,
        selected: mode.selected_servers().to_vec(),
    };
    let mut requests = Vec::new();
    for &server_index in mode.selected_servers() {
        if let Some((old_label, input_index)) = mode.old_side() {
            requests.push(RssRound1Request {
                round_name: ROUND_1_NAME.to_string(),
                server_set: ServerSet::Old,
                server_index,
                old_servers_info: Some(servers_info.clone()),
                new_servers_info: servers_info.clone(),
                old_user_share_index: Some(input_index),
                user_temp_pubkey: client.temp_public_key.clone(),
                target_index: targets.clone(),
                auth: AuthToken {
                    label: old_label.to_string(),
                    sigs: mode.sigs().to_vec(),
                },
                key_type: config.key_type,
            });
        }
        requests.push(RssRound1Request {
            round_name: ROUND_1_NAME.to_string(),
            server_set: ServerSet::New,
            server_index,
            old_servers_info: None,
            new_servers_info: servers_info.clone(),
            old_user_share_index: None,
            user_temp_pubkey: client.temp_public_key.clone(),
            target_index: targets.clone(),
            auth: AuthToken {
                label: mode.new_label().to_string(),
                sigs: mode.sigs().to_vec(),
            },
            key_type: config.key_type,
        });
    }
    debug!(requests = requests.len(), "Round 1: dispatching co-dealer requests");

    let round_1_futures = requests.into_iter().map(|request| {
        let endpoint = &config.server_endpoints[(request.server_index - 1) as usize];
        async move {
            let body = serde_json::to_value(&request)?;
            let response = endpoint.post("/rss_round_1", body).await?;
            Ok::<RssRound1Response, Error>(serde_json::from_value(response)?)
        }
    });
    // Round 1 is fail-fast: every co-dealer must answer consistently
    let mut all_responses = vec![client_contribution::<C>(
        &mode,
        &input_share,
        &targets,
        threshold,
        &temp_pub_bytes,
        &server_pub_bytes,
    )?];
    for result in future::join_all(round_1_futures).await {
        all_responses.push(result?);
    }

    for response in &all_responses {
        if response.data.len() != targets.len() {
            return Err(Error::VerificationFailed(format!(
                "expected {} target entries in Round 1 response, got {}",
                targets.len(),
                response.data.len()
            )));
        }
        for entry in &response.data {
            if entry.target_encryptions.server_encs.len() != node_count {
                return Err(Error::VerificationFailed(format!(
                    "expected {} server encryptions, got {}",
                    node_count,
                    entry.target_encryptions.server_encs.len()
                )));
            }
        }
    }

    // ============ Aggregate, verify, re-encrypt to factor keys ============
    let temp_priv_bytes: [u8; 32] = client.temp_private_key.to_bytes().into();
    let mut master_commit_hex: Vec<Vec<HexPoint>> = Vec::with_capacity(targets.len());
    let mut server_commit_hex: Vec<Vec<HexPoint>> = Vec::with_capacity(targets.len());
    let mut user_factor_encs = Vec::with_capacity(targets.len());
    for (i, &target) in targets.iter().enumerate() {
        let target = u64::from(target);
        let master_sets = all_responses
            .iter()
            .map(|r| parse_commitments::<C>(&r.data[i].master_poly_commits, 2, "master_poly_commits"))
            .collect::<Result<Vec<_>>>()?;
        let server_sets = all_responses
            .iter()
            .map(|r| {
                parse_commitments::<C>(&r.data[i].server_poly_commits, threshold, "server_poly_commits")
            })
            .collect::<Result<Vec<_>>>()?;
        let master = sum_commitments::<C>(&master_sets);
        let server = sum_commitments::<C>(&server_sets);
        verify_aggregate::<C>(target, &master, &server, &dkg_new_pub, &tss_pub)?;

        let mut user_share = C::Scalar::zero();
        for response in &all_responses {
            let plaintext =
                ecies::decrypt(&temp_priv_bytes, &response.data[i].target_encryptions.user_enc)?;
            user_share = user_share + scalar_from_plaintext::<C>(&plaintext)?;
        }
        if C::generator() * user_share != evaluate_commitments::<C>(&master, USER_SHARE_INDEX) {
            return Err(Error::UserShareMismatch { target });
        }
        let share_bytes = Zeroizing::new(user_share.to_be_bytes());
        user_factor_encs.push(ecies::encrypt(&factor_pub_bytes[i], share_bytes.as_slice())?);
        master_commit_hex.push(master.iter().map(C::to_hex_point).collect());
        server_commit_hex.push(server.iter().map(C::to_hex_point).collect());
    }
    info!(
        targets = targets.len(),
        co_dealers = all_responses.len(),
        "Round 1 aggregate verified"
    );

    // ============ Round 2: per-server share columns, best-effort ============
    let round_2_futures = (1..=node_count).map(|server_index| {
        let data: Vec<RssRound2RequestData> = (0..targets.len())
            .map(|i| RssRound2RequestData {
                master_commits: master_commit_hex[i].clone(),
                server_commits: server_commit_hex[i].clone(),
                server_encs: all_responses
                    .iter()
                    .map(|r| r.data[i].target_encryptions.server_encs[server_index - 1].clone())
                    .collect(),
                factor_pubkeys: vec![factor_pubs[i].clone()],
            })
            .collect();
        let request = RssRound2Request {
            round_name: ROUND_2_NAME.to_string(),
            server_index: server_index as u32,
            target_index: targets.clone(),
            data,
            key_type: config.key_type,
        };
        let endpoint = &config.server_endpoints[server_index - 1];
        async move {
            let body = serde_json::to_value(&request)?;
            let response = endpoint.post("/rss_round_2", body).await?;
            Ok::<RssRound2Response, Error>(serde_json::from_value(response)?)
        }
    });
    debug!(servers = node_count, "Round 2: dispatching share columns");

    let mut round_2: Vec<Option<RssRound2Response>> = Vec::with_capacity(node_count);
    for (j, result) in future::join_all(round_2_futures).await.into_iter().enumerate() {
        match result {
            Ok(response)
                if response.data.len() == targets.len()
                    && response.data.iter().all(|d| d.encs.len() == 1) =>
            {
                round_2.push(Some(response));
            }
            Ok(_) => {
                warn!(server_index = j + 1, "Round 2 response has unexpected shape, dropping");
                round_2.push(None);
            }
            Err(error) => {
                warn!(server_index = j + 1, %error, "Round 2 request failed, continuing");
                round_2.push(None);
            }
        }
    }
    let usable = round_2.iter().filter(|r| r.is_some()).count();
    if usable < threshold {
        return Err(Error::InsufficientServerResponses {
            required: threshold,
            actual: usable,
        });
    }

    let output = targets
        .iter()
        .enumerate()
        .map(|(i, &target)| RefreshResponse {
            target_index: target,
            factor_pub: factor_pubs[i].clone(),
            server_factor_encs: round_2
                .iter()
                .map(|r| r.as_ref().map(|response| response.data[i].encs[0].clone()))
                .collect(),
            user_factor_enc: user_factor_encs[i].clone(),
        })
        .collect();
    info!(usable_servers = usable, "Protocol completed");
    Ok(output)
}

fn validate_options(mode: &Mode, node_count: usize, threshold: usize) -> Result<()> {
    let targets = mode.target_indexes();
    let factor_pubs = mode.factor_pubs();
    if factor_pubs.len() != targets.len() {
        return Err(Error::LengthMismatch {
            expected: targets.len(),
            actual: factor_pubs.len(),
        });
    }
    if targets.is_empty() {
        return Err(Error::InvalidInput("no target indexes supplied".into()));
    }
    let mut seen_targets = HashSet::new();
    for &target in targets {
        if !seen_targets.insert(target) {
            return Err(Error::InvalidInput(format!("duplicate target index {target}")));
        }
    }
    let selected = mode.selected_servers();
    if selected.len() != threshold {
        return Err(Error::InvalidInput(format!(
            "exactly {threshold} servers must be selected, got {}",
            selected.len()
        )));
    }
    let mut seen_servers = HashSet::new();
    for &index in selected {
        if index == 0 || index as usize > node_count {
            return Err(Error::InvalidInput(format!(
                "selected server index {index} out of range 1..={node_count}"
            )));
        }
        if !seen_servers.insert(index) {
            return Err(Error::InvalidInput(format!(
                "duplicate selected server index {index}"
            )));
        }
    }
    if let Some((_, input_index)) = mode.old_side() {
        if !(2..=3).contains(&input_index) {
            return Err(Error::InvalidInput(format!(
                "input index must be 2 or 3, got {input_index}"
            )));
        }
    }
    Ok(())
}

/// Final Lagrange coefficient of the client's co-dealer contribution
///
/// Refresh lifts the input share from its master index to 0, then reshares
/// along the `{0, 1}` line to the target; import starts at 0 directly.
fn client_coefficient<C: Curve>(mode: &Mode, target: u64) -> Result<C::Scalar> {
    let reshare = poly::lagrange_coefficient::<C>(&[0, 1], 0, target)?;
    match mode.old_side() {
        Some((_, input_index)) => {
            let input_index = u64::from(input_index);
            let lift = poly::lagrange_coefficient::<C>(&[1, input_index], input_index, 0)?;
            Ok(lift * reshare)
        }
        None => Ok(reshare),
    }
}

/// The client's own Round 1 response, prepended to the committee's
fn client_contribution<C: Curve>(
    mode: &Mode,
    input_share: &C::Scalar,
    targets: &[u32],
    threshold: usize,
    temp_pub_bytes: &[u8; 65],
    server_pub_bytes: &[[u8; 65]],
) -> Result<RssRound1Response> {
    let mut rng = OsRng;
    let mut data = Vec::with_capacity(targets.len());
    for &target in targets {
        let coefficient = client_coefficient::<C>(mode, u64::from(target))?;
        let (contribution, _) = deal_contribution::<C, _>(
            &mut rng,
            coefficient * *input_share,
            threshold,
            temp_pub_bytes,
            server_pub_bytes,
        )?;
        data.push(contribution);
    }
    Ok(RssRound1Response {
        target_index: targets.to_vec(),
        data,
    })
}

/// Build one hierarchical co-dealer contribution
///
/// A degree-1 master polynomial with the given y-intercept, a degree-(T-1)
/// server polynomial anchored at the master's value at x = 1, Feldman
/// commitments to both, the user share at the fixed index encrypted to the
/// ephemeral key, and the server shares at 1..=N encrypted to each server
/// key. The user share scalar is returned alongside so callers can re-wrap
/// it.
pub(crate) fn deal_contribution<C: Curve, R: RngCore + CryptoRng>(
    rng: &mut R,
    y_intercept: C::Scalar,
    threshold: usize,
    user_pubkey: &[u8; 65],
    server_pubkeys: &[[u8; 65]],
) -> Result<(RssRound1ResponseData, C::Scalar)> {
    let master_poly = poly::generate_polynomial::<C, _>(1, Some(y_intercept), rng);
    let join = poly::eval_polynomial_at::<C>(&master_poly, 1);
    let server_poly =
        poly::generate_polynomial::<C, _>(threshold.saturating_sub(1), Some(join), rng);

    let master_poly_commits = master_poly
        .iter()
        .map(|a| C::to_hex_point(&(C::generator() * *a)))
        .collect();
    let server_poly_commits = server_poly
        .iter()
        .map(|a| C::to_hex_point(&(C::generator() * *a)))
        .collect();

    let user_share = poly::eval_polynomial_at::<C>(&master_poly, USER_SHARE_INDEX);
    let user_enc = ecies::encrypt(user_pubkey, &user_share.to_be_bytes())?;
    let server_encs = server_pubkeys
        .iter()
        .enumerate()
        .map(|(j, pubkey)| {
            let share = poly::eval_polynomial_at::<C>(&server_poly, j as u64 + 1);
            ecies::encrypt(pubkey, &share.to_be_bytes())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((
        RssRound1ResponseData {
            master_poly_commits,
            server_poly_commits,
            target_encryptions: TargetEncryptions {
                user_enc,
                server_encs,
            },
        },
        user_share,
    ))
}
