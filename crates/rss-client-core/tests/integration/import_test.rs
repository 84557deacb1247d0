//! Import round trips: an externally generated secret becomes the new TSS
//! private key, recoverable through the same factor-encryption outputs.

use crate::support::{
    assert_reconstructs, factor_keypair, random_scalar_hex, recover_share, setup_committee,
    N, NEW_LABEL,
};
use rss_client_core::{Error, ImportOptions, KeyType};

fn import_options(
    committee: &crate::support::Committee,
    import_key: String,
    factor_pubs: Vec<rss_client_core::HexPoint>,
) -> ImportOptions {
    ImportOptions {
        new_label: NEW_LABEL.to_string(),
        sigs: vec!["session-sig".to_string()],
        dkg_new_pub: committee.dkg_new_pub.clone(),
        import_key,
        target_indexes: vec![2, 3],
        selected_servers: vec![1, 2, 3],
        factor_pubs,
    }
}

async fn run_import_round_trip(key_type: KeyType) {
    let committee = setup_committee(key_type, 2).await;
    let import_key = random_scalar_hex(key_type);

    // The imported secret replaces the old TSS key, so the client binds the
    // aggregate against its public counterpart
    let mut committee = committee;
    committee.tss_pub = match key_type {
        KeyType::Secp256k1 => {
            use rss_client_core::curve::{Curve, CurveScalar, Secp256k1};
            let k = <Secp256k1 as Curve>::Scalar::from_hex(&import_key).unwrap();
            Secp256k1::to_hex_point(&(Secp256k1::generator() * k))
        }
        KeyType::Ed25519 => {
            use rss_client_core::curve::{Curve, CurveScalar, Ed25519};
            let k = <Ed25519 as Curve>::Scalar::from_hex(&import_key).unwrap();
            Ed25519::to_hex_point(&(Ed25519::generator() * k))
        }
    };
    let client = committee.client();

    let factors: Vec<_> = (0..2).map(|_| factor_keypair()).collect();
    let factor_pubs = factors.iter().map(|(_, p)| p.clone()).collect();

    let responses = client
        .import(import_options(&committee, import_key.clone(), factor_pubs))
        .await
        .unwrap();

    assert_eq!(responses.len(), 2);
    for (i, response) in responses.iter().enumerate() {
        assert_eq!(response.server_factor_encs.len(), N);
        let recovered =
            recover_share(&committee, &factors[i].0, response, &[1, 2, 3]).unwrap();
        assert_reconstructs(
            key_type,
            response.target_index,
            &recovered,
            &committee.dkg_new_priv,
            &import_key,
        );
    }
}

#[tokio::test]
async fn test_import_round_trip_secp256k1() {
    run_import_round_trip(KeyType::Secp256k1).await;
}

#[tokio::test]
async fn test_import_round_trip_ed25519() {
    run_import_round_trip(KeyType::Ed25519).await;
}

#[tokio::test]
async fn test_import_length_contract() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (_, factor_pub) = factor_keypair();

    let options = import_options(
        &committee,
        random_scalar_hex(KeyType::Secp256k1),
        vec![factor_pub],
    );
    assert!(matches!(
        client.import(options).await.unwrap_err(),
        Error::LengthMismatch { .. }
    ));
}
