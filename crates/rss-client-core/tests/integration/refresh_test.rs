//! Refresh round trips: the refreshed shares must recombine to the original
//! TSS secret on both curves, for every target index.

use crate::support::{
    assert_reconstructs, curve_under_test, factor_keypair, recover_share, setup_committee,
    N, NEW_LABEL, OLD_LABEL,
};
use rss_client_core::{Error, KeyType, RefreshOptions};

fn refresh_options(
    committee: &crate::support::Committee,
    factor_pubs: Vec<rss_client_core::HexPoint>,
) -> RefreshOptions {
    RefreshOptions {
        old_label: OLD_LABEL.to_string(),
        new_label: NEW_LABEL.to_string(),
        sigs: vec!["session-sig".to_string()],
        dkg_new_pub: committee.dkg_new_pub.clone(),
        input_share: committee.input_share.clone(),
        input_index: committee.input_index,
        target_indexes: vec![2, 3],
        selected_servers: vec![1, 2, 3],
        factor_pubs,
    }
}

async fn run_refresh_round_trip(key_type: KeyType, input_index: u32) {
    let committee = setup_committee(key_type, input_index).await;
    let client = committee.client();

    let factors: Vec<_> = (0..2).map(|_| factor_keypair()).collect();
    let factor_pubs = factors.iter().map(|(_, p)| p.clone()).collect();

    let responses = client
        .refresh(refresh_options(&committee, factor_pubs))
        .await
        .unwrap();

    assert_eq!(responses.len(), 2);
    for (i, response) in responses.iter().enumerate() {
        assert_eq!(response.target_index, [2, 3][i]);
        assert_eq!(response.server_factor_encs.len(), N);
        assert!(response.server_factor_encs.iter().all(Option::is_some));

        let recovered =
            recover_share(&committee, &factors[i].0, response, &[1, 2, 3]).unwrap();
        assert_reconstructs(
            key_type,
            response.target_index,
            &recovered,
            &committee.dkg_new_priv,
            &committee.tss_priv,
        );
    }
}

#[tokio::test]
async fn test_refresh_round_trip_secp256k1() {
    run_refresh_round_trip(KeyType::Secp256k1, 2).await;
}

#[tokio::test]
async fn test_refresh_round_trip_secp256k1_input_index_3() {
    run_refresh_round_trip(KeyType::Secp256k1, 3).await;
}

#[tokio::test]
async fn test_refresh_round_trip_ed25519() {
    run_refresh_round_trip(KeyType::Ed25519, 2).await;
}

#[tokio::test]
async fn test_refresh_round_trip_env_curve() {
    run_refresh_round_trip(curve_under_test(), 2).await;
}

#[tokio::test]
async fn test_recovery_works_with_any_threshold_subset() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (factor_key, factor_pub) = factor_keypair();

    let mut options = refresh_options(&committee, vec![factor_pub]);
    options.target_indexes = vec![2];
    let responses = client.refresh(options).await.unwrap();

    // All N server slots are populated, so any T of them reconstruct
    for selected in [[1, 2, 3], [2, 3, 4], [1, 4, 5], [3, 4, 5]] {
        let recovered =
            recover_share(&committee, &factor_key, &responses[0], &selected).unwrap();
        assert_reconstructs(
            KeyType::Secp256k1,
            2,
            &recovered,
            &committee.dkg_new_priv,
            &committee.tss_priv,
        );
    }
}

#[tokio::test]
async fn test_factor_pub_length_mismatch_fails_before_any_round() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (_, factor_pub) = factor_keypair();

    // Two targets, one factor key
    let options = refresh_options(&committee, vec![factor_pub]);
    let error = client.refresh(options).await.unwrap_err();
    assert!(matches!(
        error,
        Error::LengthMismatch {
            expected: 2,
            actual: 1
        }
    ));
}

#[tokio::test]
async fn test_input_index_must_be_two_or_three() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (_, factor_pub) = factor_keypair();

    let mut options = refresh_options(&committee, vec![factor_pub.clone(), factor_pub]);
    options.input_index = 4;
    assert!(matches!(
        client.refresh(options).await.unwrap_err(),
        Error::InvalidInput(_)
    ));
}

#[tokio::test]
async fn test_wrong_selected_server_count_rejected() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (_, factor_pub) = factor_keypair();

    let mut options = refresh_options(&committee, vec![factor_pub.clone(), factor_pub]);
    options.selected_servers = vec![1, 2];
    assert!(matches!(
        client.refresh(options).await.unwrap_err(),
        Error::InvalidInput(_)
    ));
}
