//! # Nexus State Linkage
//!
//! Config-driven setup of the registry, then Nexus block and chain-state
//! submission through the proof manager against the in-memory state manager.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use nexus_relay::ports::outbound::{
        CollectingErrorSink, MockAccountStateSource, MockMailboxContract, MockProofRpc,
    };
    use nexus_relay::{
        AccountState, AccountStateResponse, ChainKind, ChainVerifier, InMemoryStateManager,
        MailboxClient, NexusHeader, ProofManager, RelayConfig, RelayError, Verifier,
    };

    const CONFIG: &str = r#"
        nexus_url = "http://nexus:7000"

        [[chains]]
        app_id = "sepolia"
        kind = "evm-l1"
        rpc_endpoint = "http://127.0.0.1:8545"
        mailbox_contract = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        state_manager_contract = "0xa5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5"
        native_chain_id = "11155111"

        [[chains]]
        app_id = "zksync-era"
        kind = "zk-rollup-l2"
        rpc_endpoint = "http://127.0.0.1:3050"
        mailbox_contract = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
        state_manager_contract = "0x5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b"
        native_chain_id = "270"
        block_query_offset = 10
    "#;

    const SEPOLIA_ACCOUNT: &str =
        "688e94a51ee508a95e761294afb7a6004b432c15d9890c80ddf23bde8caa4c26";

    fn load_config() -> RelayConfig {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        RelayConfig::load(file.path()).unwrap()
    }

    fn account(height: u64) -> AccountState {
        AccountState {
            statement_digest: [0x0A; 32],
            state_root: [0x0B; 32],
            start_nexus_hash: [0x0C; 32],
            last_proof_height: height - 1,
            height,
        }
    }

    fn response(nexus_height: u64, chain_height: u64) -> AccountStateResponse {
        AccountStateResponse {
            chain_state_number: chain_height,
            state_root: [0x77; 32],
            account: account(chain_height),
            proof: vec![[0x21; 32], [0x22; 32], [0x23; 32]],
            value_hash: [0x24; 32],
            nexus_header: NexusHeader {
                parent_hash: [0x01; 32],
                prev_state_root: [0x02; 32],
                state_root: [0x77; 32],
                avail_header_hash: [0x03; 32],
                number: nexus_height,
            },
        }
    }

    #[test]
    fn test_config_builds_registry_and_options() {
        let config = load_config();
        let registry = config.build_registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.resolve("zksync-era").unwrap().state_manager_contract,
            Some([0x5B; 20])
        );
        assert_eq!(config.verifier_options("zksync-era").unwrap().block_query_offset, 10);
        assert_eq!(config.verifier_options("sepolia").unwrap().block_query_offset, 64);
    }

    #[tokio::test]
    async fn test_configured_offset_drives_latest_height() {
        let config = load_config();
        let registry = Arc::new(config.build_registry().unwrap());
        let mailbox = Arc::new(MailboxClient::new(
            registry.clone(),
            Arc::new(MockMailboxContract::default()),
            Arc::new(CollectingErrorSink::default()),
        ));
        let verifier = Verifier::for_entry(
            registry.resolve("zksync-era").unwrap(),
            Arc::new(MockProofRpc::with_latest(500)),
            mailbox,
            config.verifier_options("zksync-era").unwrap(),
        )
        .unwrap();
        assert_eq!(verifier.kind(), ChainKind::ZkRollupL2);

        match verifier {
            Verifier::ZkRollup(v) => {
                assert_eq!(v.provider().resolve_height(None).await.unwrap(), 490)
            }
            Verifier::EvmL1(_) => panic!("zksync-era is a zk rollup"),
        }
    }

    #[tokio::test]
    async fn test_block_then_chain_state_round_trip() {
        let registry = load_config().build_registry().unwrap();
        let state_manager = Arc::new(InMemoryStateManager::new());
        let sink = Arc::new(CollectingErrorSink::default());
        let manager =
            ProofManager::new(&registry, "zksync-era", state_manager.clone(), sink.clone())
                .unwrap();
        assert_eq!(manager.contract_address(), [0x5B; 20]);

        manager
            .update_nexus_block(12, [0x77; 32], [0x78; 32], &[0xDE, 0xAD])
            .await
            .unwrap();
        let source = MockAccountStateSource::returning(response(12, 4400));
        manager.sync_chain_state(&source, SEPOLIA_ACCOUNT).await.unwrap();

        let latest = manager.get_chain_state(SEPOLIA_ACCOUNT, None).await.unwrap();
        assert_eq!(latest, account(4400));
        let at_12 = manager
            .get_chain_state(&format!("0x{}", SEPOLIA_ACCOUNT), Some(12))
            .await
            .unwrap();
        assert_eq!(at_12, latest);

        let block = state_manager.nexus_block(12).unwrap();
        assert_eq!(block.state_root, [0x77; 32]);
        assert_eq!(state_manager.updates()[0].siblings.len(), 3);
        assert!(sink.operations().is_empty());
    }

    #[tokio::test]
    async fn test_chain_state_ahead_of_nexus_block_rejected() {
        let registry = load_config().build_registry().unwrap();
        let state_manager = Arc::new(InMemoryStateManager::new());
        let sink = Arc::new(CollectingErrorSink::default());
        let manager =
            ProofManager::new(&registry, "sepolia", state_manager.clone(), sink.clone()).unwrap();

        manager
            .update_nexus_block(3, [0x77; 32], [0x78; 32], &[])
            .await
            .unwrap();
        let source = MockAccountStateSource::returning(response(4, 10));
        assert!(matches!(
            manager.sync_chain_state(&source, SEPOLIA_ACCOUNT).await,
            Err(RelayError::DestinationRejected(_))
        ));
        assert_eq!(sink.operations(), vec!["update_chain_state".to_string()]);

        let unknown = manager.get_chain_state(SEPOLIA_ACCOUNT, None).await.unwrap();
        assert_eq!(unknown, AccountState::default());
    }

    #[test]
    fn test_unknown_manager_target() {
        let registry = load_config().build_registry().unwrap();
        let result = ProofManager::new(
            &registry,
            "arbitrum",
            Arc::new(InMemoryStateManager::new()),
            Arc::new(CollectingErrorSink::default()),
        );
        assert!(matches!(result, Err(RelayError::UnknownAppId(_))));
    }
}
