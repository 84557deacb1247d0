//! Fault scenarios: tampered commitments and shares, dropped servers, and
//! the Round 2 availability floor.

use crate::support::{
    assert_reconstructs, factor_keypair, recover_share, setup_committee, NEW_LABEL, OLD_LABEL,
};
use rss_client_core::{Error, Fault, KeyType, RefreshOptions};

fn refresh_options(
    committee: &crate::support::Committee,
    factor_pubs: Vec<rss_client_core::HexPoint>,
    targets: Vec<u32>,
) -> RefreshOptions {
    RefreshOptions {
        old_label: OLD_LABEL.to_string(),
        new_label: NEW_LABEL.to_string(),
        sigs: vec![],
        dkg_new_pub: committee.dkg_new_pub.clone(),
        input_share: committee.input_share.clone(),
        input_index: committee.input_index,
        target_indexes: targets,
        selected_servers: vec![1, 2, 3],
        factor_pubs,
    }
}

#[tokio::test]
async fn test_tampered_server_commit_is_detected() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (_, factor_pub) = factor_keypair();

    // Server 2 corrupts its server-polynomial commitment in Round 1
    committee.servers[1].set_fault(Fault::TamperServerCommit);

    let error = client
        .refresh(refresh_options(&committee, vec![factor_pub], vec![2]))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        Error::ServerMasterCommitMismatch { target: 2 }
    ));
}

#[tokio::test]
async fn test_tampered_master_commit_breaks_tss_binding() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (_, factor_pub) = factor_keypair();

    committee.servers[2].set_fault(Fault::TamperMasterCommit);

    let error = client
        .refresh(refresh_options(&committee, vec![factor_pub], vec![2]))
        .await
        .unwrap_err();
    assert!(matches!(error, Error::TssPubKeyMismatch { target: 2 }));
}

#[tokio::test]
async fn test_tampered_user_ciphertext_fails_decrypt() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (_, factor_pub) = factor_keypair();

    committee.servers[0].set_fault(Fault::TamperUserEnc);

    let error = client
        .refresh(refresh_options(&committee, vec![factor_pub], vec![2]))
        .await
        .unwrap_err();
    assert!(matches!(error, Error::Decrypt(_)));
}

#[tokio::test]
async fn test_tampered_user_share_fails_commit_binding() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (_, factor_pub) = factor_keypair();

    // Decrypts fine, but the summed share no longer matches the commitments
    committee.servers[0].set_fault(Fault::TamperUserShare);

    let error = client
        .refresh(refresh_options(&committee, vec![factor_pub], vec![2]))
        .await
        .unwrap_err();
    assert!(matches!(error, Error::UserShareMismatch { target: 2 }));
}

#[tokio::test]
async fn test_single_dropped_server_leaves_null_slot() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (factor_key, factor_pub) = factor_keypair();

    // Server 4 answers Round 1 but refuses Round 2
    committee.servers[3].set_fault(Fault::FailRound2);

    let responses = client
        .refresh(refresh_options(
            &committee,
            vec![factor_pub.clone(), factor_pub],
            vec![2, 3],
        ))
        .await
        .unwrap();

    for response in &responses {
        assert!(response.server_factor_encs[3].is_none());
        assert_eq!(
            response
                .server_factor_encs
                .iter()
                .filter(|slot| slot.is_some())
                .count(),
            4
        );
    }

    // Any threshold subset of the remaining four still recovers
    for selected in [[1, 2, 3], [1, 2, 5], [2, 3, 5]] {
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
async fn test_exactly_threshold_responses_succeed() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (factor_key, factor_pub) = factor_keypair();

    // Two of five drop out of Round 2: exactly T=3 remain
    committee.servers[3].set_fault(Fault::FailRound2);
    committee.servers[4].set_fault(Fault::FailRound2);

    let responses = client
        .refresh(refresh_options(&committee, vec![factor_pub], vec![2]))
        .await
        .unwrap();

    let recovered = recover_share(&committee, &factor_key, &responses[0], &[1, 2, 3]).unwrap();
    assert_reconstructs(
        KeyType::Secp256k1,
        2,
        &recovered,
        &committee.dkg_new_priv,
        &committee.tss_priv,
    );
}

#[tokio::test]
async fn test_below_threshold_responses_fail() {
    let committee = setup_committee(KeyType::Secp256k1, 2).await;
    let client = committee.client();
    let (_, factor_pub) = factor_keypair();

    // Three of five drop out of Round 2: only T-1=2 remain
    committee.servers[2].set_fault(Fault::FailRound2);
    committee.servers[3].set_fault(Fault::FailRound2);
    committee.servers[4].set_fault(Fault::FailRound2);

    let error = client
        .refresh(refresh_options(&committee, vec![factor_pub], vec![2]))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        Error::InsufficientServerResponses {
            required: 3,
            actual: 2
        }
    ));
}
