//! RSS Client CLI
//!
//! Command-line tool for exercising the RSS protocol engine against an
//! in-process mock committee.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use rss_client_core::curve::{Curve, CurveScalar, Ed25519, Secp256k1};
use rss_client_core::transport::ServerTransport;
use rss_client_core::{
    poly, recover, Endpoint, HexPoint, ImportOptions, KeyType, MockServer, RecoverOptions,
    RefreshOptions, RssClient, RssClientConfig,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const OLD_LABEL: &str = "cli-epoch-1";
const NEW_LABEL: &str = "cli-epoch-2";

#[derive(Parser)]
#[command(name = "rss-client")]
#[command(about = "RSS protocol simulator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full refresh + recover round trip against a mock committee
    Refresh {
        /// TSS curve (secp256k1, ed25519)
        #[arg(short, long, default_value = "secp256k1")]
        curve: String,

        /// Committee size N
        #[arg(short, long, default_value_t = 5)]
        servers: usize,

        /// Reconstruction threshold T
        #[arg(short, long, default_value_t = 3)]
        threshold: u32,
    },

    /// Import an externally generated secret, then recover it
    Import {
        /// TSS curve (secp256k1, ed25519)
        #[arg(short, long, default_value = "secp256k1")]
        curve: String,

        /// Committee size N
        #[arg(short, long, default_value_t = 5)]
        servers: usize,

        /// Reconstruction threshold T
        #[arg(short, long, default_value_t = 3)]
        threshold: u32,
    },

    /// Show protocol constants
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .pretty()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Refresh {
            curve,
            servers,
            threshold,
        } => {
            let key_type: KeyType = curve.parse()?;
            match key_type {
                KeyType::Secp256k1 => {
                    simulate::<Secp256k1>(key_type, servers, threshold, false).await?
                }
                KeyType::Ed25519 => simulate::<Ed25519>(key_type, servers, threshold, false).await?,
            }
        }
        Commands::Import {
            curve,
            servers,
            threshold,
        } => {
            let key_type: KeyType = curve.parse()?;
            match key_type {
                KeyType::Secp256k1 => {
                    simulate::<Secp256k1>(key_type, servers, threshold, true).await?
                }
                KeyType::Ed25519 => simulate::<Ed25519>(key_type, servers, threshold, true).await?,
            }
        }
        Commands::Info => show_info(),
    }

    Ok(())
}

/// Provision a committee, run the protocol, recover, and verify the result
async fn simulate<C: Curve>(
    key_type: KeyType,
    servers: usize,
    threshold: u32,
    import: bool,
) -> Result<()> {
    let t = threshold as usize;
    anyhow::ensure!(servers >= t && t >= 1, "need 1 <= threshold <= servers");
    info!(%key_type, servers, threshold, "Provisioning mock committee");

    let mut rng = OsRng;

    // 2-of-2 master sharing: secret at 0, outgoing DKG key at 1, user at 2
    let master = poly::generate_polynomial::<C, _>(1, None, &mut rng);
    let secret = master[0];
    let dkg_old_priv = poly::eval_polynomial_at::<C>(&master, 1);
    let input_share = poly::eval_polynomial_at::<C>(&master, 2);
    let dkg_new_priv = C::Scalar::random(&mut rng);
    let import_key = C::Scalar::random(&mut rng);

    let old_sharing = poly::generate_polynomial::<C, _>(t - 1, Some(dkg_old_priv), &mut rng);
    let new_sharing = poly::generate_polynomial::<C, _>(t - 1, Some(dkg_new_priv), &mut rng);

    let mut endpoints = Vec::with_capacity(servers);
    let mut server_pubkeys = Vec::with_capacity(servers);
    for j in 1..=servers as u64 {
        let server = Arc::new(MockServer::new());
        let ecies_priv = <Secp256k1 as Curve>::Scalar::random(&mut rng);
        server
            .post(
                "/private_key",
                serde_json::json!({ "private_key": ecies_priv.to_hex() }),
            )
            .await?;
        let response = server.get("/public_key").await?;
        let pubkey: HexPoint = serde_json::from_value(response["public_key"].clone())?;
        server
            .post(
                "/tss_share",
                serde_json::json!({
                    "label": OLD_LABEL,
                    "tss_share": poly::eval_polynomial_at::<C>(&old_sharing, j).to_hex(),
                }),
            )
            .await?;
        server
            .post(
                "/tss_share",
                serde_json::json!({
                    "label": NEW_LABEL,
                    "tss_share": poly::eval_polynomial_at::<C>(&new_sharing, j).to_hex(),
                }),
            )
            .await?;
        endpoints.push(Endpoint::mock(server));
        server_pubkeys.push(pubkey);
    }

    // Import replaces the secret entirely; refresh preserves it
    let expected = if import { import_key } else { secret };
    let client = RssClient::new(RssClientConfig {
        tss_pub_key: C::to_hex_point(&(C::generator() * expected)),
        server_endpoints: endpoints,
        server_threshold: threshold,
        server_pubkeys,
        key_type,
        temp_key: None,
    })?;

    let factor_priv = <Secp256k1 as Curve>::Scalar::random(&mut rng);
    let factor_pub = Secp256k1::to_hex_point(&(Secp256k1::generator() * factor_priv));
    let selected_servers: Vec<u32> = (1..=threshold).collect();
    let target_indexes = vec![2u32, 3];
    let factor_pubs = vec![factor_pub.clone(), factor_pub];

    let responses = if import {
        client
            .import(ImportOptions {
                new_label: NEW_LABEL.to_string(),
                sigs: vec![],
                dkg_new_pub: C::to_hex_point(&(C::generator() * dkg_new_priv)),
                import_key: import_key.to_hex(),
                target_indexes,
                selected_servers: selected_servers.clone(),
                factor_pubs,
            })
            .await?
    } else {
        client
            .refresh(RefreshOptions {
                old_label: OLD_LABEL.to_string(),
                new_label: NEW_LABEL.to_string(),
                sigs: vec![],
                dkg_new_pub: C::to_hex_point(&(C::generator() * dkg_new_priv)),
                input_share: input_share.to_hex(),
                input_index: 2,
                target_indexes,
                selected_servers: selected_servers.clone(),
                factor_pubs,
            })
            .await?
    };

    println!(
        "\n{} completed for {} targets\n",
        if import { "Import" } else { "Refresh" },
        responses.len()
    );

    for response in &responses {
        let recovered_hex = recover(&RecoverOptions {
            key_type,
            factor_key: factor_priv.to_hex(),
            user_enc: response.user_factor_enc.clone(),
            server_encs: response.server_factor_encs.clone(),
            selected_servers: selected_servers.clone(),
        })?;
        let recovered = C::Scalar::from_hex(&recovered_hex)?;

        // Interpolate {1: dkg_new, t: recovered} back to the secret
        let target = u64::from(response.target_index);
        let eta1 = poly::lagrange_coefficient::<C>(&[1, target], 1, 0)?;
        let eta2 = poly::lagrange_coefficient::<C>(&[1, target], target, 0)?;
        let combined = eta1 * dkg_new_priv + eta2 * recovered;
        anyhow::ensure!(combined == expected, "recovered share does not recombine");
        println!(
            "  target {}: recovered share verified against the {} key",
            response.target_index,
            if import { "imported" } else { "original TSS" }
        );
    }

    let summary = serde_json::json!({
        "key_type": key_type.as_str(),
        "servers": servers,
        "threshold": threshold,
        "targets": responses.iter().map(|r| r.target_index).collect::<Vec<_>>(),
        "server_factor_encs": responses[0]
            .server_factor_encs
            .iter()
            .filter(|slot| slot.is_some())
            .count(),
    });
    println!("\n{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn show_info() {
    println!("RSS Client v{}", rss_client_core::VERSION);
    println!();
    println!("Protocol:");
    println!("  Rounds: 2 (co-dealer contributions, share columns)");
    println!("  Co-dealers: 2T+1 for refresh, T+1 for import");
    println!(
        "  Fixed user share index: {}",
        rss_client_core::USER_SHARE_INDEX
    );
    println!();
    println!("Supported TSS curves:");
    println!("  - secp256k1");
    println!("  - ed25519 (ECIES layer stays on secp256k1)");
}
