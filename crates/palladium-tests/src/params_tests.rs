//! Network parameter and genesis scenarios.

use palladium_consensus::{
    ChainParams, Deployment, DeploymentPos, Network, RegtestOverrides, MAX_BLOCK_HEIGHT,
};

#[test]
fn test_genesis_blocks_hash_to_published_values() {
    // Construction already asserts these; the explicit comparison
    // here pins the wire encoding end to end.
    let main = ChainParams::main();
    assert_eq!(
        main.genesis.hash().to_string(),
        "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
    );
    assert_eq!(
        main.genesis.header.merkle_root.to_string(),
        "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
    );
    assert_eq!(main.genesis.txs.len(), 1);
    assert!(main.genesis.txs[0].is_coinbase());

    let test = ChainParams::test();
    assert_eq!(
        test.genesis.hash().to_string(),
        "000000000933ea01ad0ee984209779baaec3ced90fa3f408719526f8d77f4943"
    );
    assert_eq!(test.genesis.header.nonce, 414098458);

    let regtest = ChainParams::regtest(&RegtestOverrides::default()).unwrap();
    assert_eq!(
        regtest.genesis.hash().to_string(),
        "0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206"
    );
    // Same coinbase on every network.
    assert_eq!(test.genesis.header.merkle_root, main.genesis.header.merkle_root);
    assert_eq!(regtest.genesis.header.merkle_root, main.genesis.header.merkle_root);
}

#[test]
fn test_mainnet_consensus_constants() {
    let params = ChainParams::main();
    let consensus = &params.consensus;
    assert_eq!(consensus.subsidy_halving_interval, 210_000);
    assert_eq!(consensus.bip34_height, 29_000);
    assert_eq!(consensus.bip65_height, 29_000);
    assert_eq!(consensus.bip66_height, 29_000);
    assert_eq!(consensus.csv_height, 29_000);
    assert_eq!(consensus.segwit_height, 29_000);
    assert_eq!(consensus.pow_target_spacing, 600);
    assert_eq!(consensus.pow_target_spacing_v2, 120);
    assert_eq!(consensus.pow_target_timespan, 86_400);
    assert_eq!(consensus.rule_change_activation_threshold, 720);
    assert_eq!(consensus.miner_confirmation_window, 540);
    assert!(!consensus.allow_min_difficulty_blocks);
    assert!(!consensus.pow_no_retargeting);
}

#[test]
fn test_segwit_height_disable_and_range() {
    let disabled = ChainParams::regtest(&RegtestOverrides {
        segwit_height: Some(-1),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(disabled.consensus.segwit_height, MAX_BLOCK_HEIGHT);

    let err = ChainParams::regtest(&RegtestOverrides {
        segwit_height: Some(9_999_999_999),
        ..Default::default()
    })
    .unwrap_err();
    assert!(err.message.contains("out of valid range"));
}

#[test]
fn test_vbparams_override_and_rejection() {
    let tweaked = ChainParams::regtest(&RegtestOverrides {
        vbparams: vec!["testdummy:10:20".to_string()],
        ..Default::default()
    })
    .unwrap();
    let deployment = tweaked.consensus.deployment(DeploymentPos::TestDummy);
    assert_eq!(deployment.start_time, 10);
    assert_eq!(deployment.timeout, 20);
    assert_eq!(deployment.bit, 28);

    for malformed in [
        "testdummy",
        "testdummy:1",
        "testdummy:one:2",
        "testdummy:1:two",
        "unknown:1:2",
    ] {
        assert!(
            ChainParams::regtest(&RegtestOverrides {
                vbparams: vec![malformed.to_string()],
                ..Default::default()
            })
            .is_err(),
            "case {}",
            malformed
        );
    }
}

#[test]
fn test_deployment_sentinels() {
    assert_eq!(Deployment::NO_TIMEOUT, i64::MAX);
    assert_eq!(Deployment::ALWAYS_ACTIVE, -1);
    let test = ChainParams::test();
    assert_eq!(
        test.consensus.deployment(DeploymentPos::TestDummy).timeout,
        Deployment::NO_TIMEOUT
    );
}

#[test]
fn test_network_names_round_trip() {
    for network in [Network::Main, Network::Test, Network::Regtest] {
        let parsed: Network = network.as_str().parse().unwrap();
        assert_eq!(parsed, network);
    }
    assert!("nonsense".parse::<Network>().is_err());
}

#[test]
fn test_auxpow_activation_defaults() {
    let main = ChainParams::main();
    assert!(main.consensus.auxpow_active(310_000));
    assert!(!main.consensus.auxpow_active(309_999));

    // Regtest ships with the fork disabled until overridden.
    let regtest = ChainParams::regtest(&RegtestOverrides::default()).unwrap();
    assert!(!regtest.consensus.auxpow_active(1_000_000));
}
