//! # Relay Flow
//!
//! App `a` (EVM L1, chain "1") sends to app `b` (zk-Rollup, chain "300").
//! `a`'s verifier proves the receipt slot in `a`'s mailbox and delivers it
//! to `b`'s mailbox; messages from `b` go the other way through `b`'s
//! verifier.
//!
//! The expected wire bytes below were produced independently of this crate
//! from the Solidity ABI rules and a reference Keccak-256.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join_all;

    use nexus_relay::algorithms::{decode_proof_bytes, encode_receipt};
    use nexus_relay::domain::hex::{decode_hex, parse_hash};
    use nexus_relay::ports::outbound::{CollectingErrorSink, MockMailboxContract, MockProofRpc};
    use nexus_relay::{
        keccak256, pad_identifier, ChainEntry, ChainKind, ChainRegistry, ChainVerifier,
        EvmL1Args, EvmL1Verifier, MailboxClient, ProofArgs, ProofLayout, Receipt, ReceiveStage,
        RelayError, Verifier, VerifierOptions, ZkRollupArgs, ZkRollupVerifier,
    };

    // =============================================================================
    // FIXTURES
    // =============================================================================

    const RECEIPT_ENCODING: &str = concat!(
        "0000000000000000000000000000000000000000000000000000000000000020",
        "0000000000000000000000000000000000000000000000000000000000000031",
        "00000000000000000000000000000000000000000000000000000000000000c0",
        "0000000000000000000000000000000000000000000000000000000000000100",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "0000000000000000000000000000000000000000000000000000000000000140",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "0000000000000000000000000000000000000000000000000000000000333030",
        "0000000000000000000000000000000000000000000000000000000000000002",
        "1234000000000000000000000000000000000000000000000000000000000000",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "0000000000000000000000000000000000000000000000000000000000000002",
    );

    const RECEIPT_DIGEST: &str =
        "0x093bb5499a8b9761718139857112a8008815c9e0c0614df7e21805d0e13ef74c";

    const RECEIPT_SLOT: &str =
        "0x8fdb5ef8c028c93d08d39461caeff77568f1bf11bcb158cedb373e79e9eb856a";

    /// Merkle-Patricia tuple proving the slot in `a`'s mailbox at block 850.
    const ENCODED_PROOF: &str = concat!(
        "0000000000000000000000000000000000000000000000000000000000000352",
        "000000000000000000000000aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
        "8fdb5ef8c028c93d08d39461caeff77568f1bf11bcb158cedb373e79e9eb856a",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "00000000000000000000000000000000000000000000000000000000000000c0",
        "0000000000000000000000000000000000000000000000000000000000000000",
        "0000000000000000000000000000000000000000000000000000000000000002",
        "0000000000000000000000000000000000000000000000000000000000000040",
        "00000000000000000000000000000000000000000000000000000000000000c0",
        "0000000000000000000000000000000000000000000000000000000000000053",
        "f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8",
        "f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8",
        "f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f8f800000000000000000000000000",
        "0000000000000000000000000000000000000000000000000000000000000008",
        "8fdb5ef8c028c93d000000000000000000000000000000000000000000000000",
    );

    /// Slot of the same message sent from `b` to `a`.
    const RETURN_SLOT: &str =
        "0x49a207f66e8e9562ab4f543d5dec4f09e74bc4d954f042038f54f0010c9b6dbf";

    /// Sparse Merkle tuple proving `RETURN_SLOT` in `b`'s mailbox at batch 850.
    const RETURN_PROOF: &str = concat!(
        "0000000000000000000000000000000000000000000000000000000000000352",
        "000000000000000000000000bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
        "49a207f66e8e9562ab4f543d5dec4f09e74bc4d954f042038f54f0010c9b6dbf",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "00000000000000000000000000000000000000000000000000000000000000c0",
        "0000000000000000000000000000000000000000000000000000000000000007",
        "0000000000000000000000000000000000000000000000000000000000000003",
        "0101010101010101010101010101010101010101010101010101010101010101",
        "0202020202020202020202020202020202020202020202020202020202020202",
        "0303030303030303030303030303030303030303030303030303030303030303",
    );

    struct Relay {
        registry: Arc<ChainRegistry>,
        contract: Arc<MockMailboxContract>,
        sink: Arc<CollectingErrorSink>,
        mailbox: Arc<MailboxClient<MockMailboxContract>>,
        rpc: Arc<MockProofRpc>,
    }

    impl Relay {
        fn new(contract: MockMailboxContract, rpc: MockProofRpc) -> Self {
            let registry = Arc::new(ChainRegistry::new());
            for entry in [
                ChainEntry::new(
                    "a",
                    ChainKind::EvmL1,
                    "http://chain-a:8545",
                    [0xAA; 20],
                    [0xA5; 20],
                    "1",
                ),
                ChainEntry::new(
                    "b",
                    ChainKind::ZkRollupL2,
                    "http://chain-b:3050",
                    [0xBB; 20],
                    [0xB5; 20],
                    "300",
                ),
                ChainEntry::new(
                    "c",
                    ChainKind::EvmL1,
                    "http://chain-c:8545",
                    [0xCC; 20],
                    [0xC5; 20],
                    "5",
                ),
            ] {
                registry.add_chain(entry).unwrap();
            }

            let contract = Arc::new(contract);
            let sink = Arc::new(CollectingErrorSink::default());
            let mailbox = Arc::new(MailboxClient::new(
                registry.clone(),
                contract.clone(),
                sink.clone(),
            ));
            Self {
                registry,
                contract,
                sink,
                mailbox,
                rpc: Arc::new(rpc),
            }
        }

        fn entry(&self, app_id: &str) -> ChainEntry {
            self.registry.resolve(app_id).unwrap()
        }

        fn verifier_a(&self) -> EvmL1Verifier<MockProofRpc, MockMailboxContract> {
            EvmL1Verifier::new(
                self.entry("a"),
                self.rpc.clone(),
                self.mailbox.clone(),
                VerifierOptions::for_kind(ChainKind::EvmL1),
            )
            .unwrap()
        }

        fn verifier_b(&self) -> ZkRollupVerifier<MockProofRpc, MockMailboxContract> {
            ZkRollupVerifier::new(
                self.entry("b"),
                self.rpc.clone(),
                self.mailbox.clone(),
                VerifierOptions::for_kind(ChainKind::ZkRollupL2),
            )
            .unwrap()
        }

        /// Message from `a` to `b`.
        fn receipt(&self, nonce: u64) -> Receipt {
            self.mailbox
                .new_receipt("a", &["b"], &[0x12, 0x34], "0x01", &["0x02"], nonce)
                .unwrap()
        }

        /// Message from `b` to `a`.
        fn return_receipt(&self, nonce: u64) -> Receipt {
            self.mailbox
                .new_receipt("b", &["a"], &[0x12, 0x34], "0x01", &["0x02"], nonce)
                .unwrap()
        }
    }

    fn patricia_rpc() -> MockProofRpc {
        MockProofRpc {
            patricia: true,
            ..MockProofRpc::default()
        }
    }

    fn slot_of(receipt: &Receipt) -> [u8; 32] {
        nexus_relay::calculate_storage_slot(&receipt.digest(), 0)
    }

    // =============================================================================
    // END-TO-END
    // =============================================================================

    #[tokio::test]
    async fn test_send_then_deliver_produces_expected_wire_bytes() {
        let relay = Relay::new(MockMailboxContract::default(), patricia_rpc());

        let sent = relay
            .mailbox
            .send_message("a", &["b"], &["0x02"], 1, &[0x12, 0x34])
            .await
            .unwrap();
        assert_eq!(sent, keccak256(&0u64.to_be_bytes()));

        let receipt = relay.receipt(1);
        assert_eq!(encode_receipt(&receipt), decode_hex(RECEIPT_ENCODING).unwrap());
        assert_eq!(receipt.digest(), parse_hash(RECEIPT_DIGEST).unwrap());

        let slot = slot_of(&receipt);
        assert_eq!(slot, parse_hash(RECEIPT_SLOT).unwrap());

        let outcome = relay
            .verifier_a()
            .receive_message(850, &receipt, EvmL1Args::with_storage_key(slot))
            .await
            .unwrap();
        assert_eq!(outcome.app_id, "b");
        assert_eq!(outcome.at_height, 850);
        assert_eq!(outcome.storage_slot, slot);
        assert_eq!(outcome.stage, ReceiveStage::Confirmed);
        assert_eq!(outcome.tx_hash, keccak256(&1u64.to_be_bytes()));

        // proven in the source mailbox
        let requests = relay.rpc.recorded();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].account, [0xAA; 20]);
        assert_eq!(requests[0].keys, vec![slot]);
        assert_eq!(requests[0].height, 850);

        // delivered to the destination mailbox
        let received = relay.contract.received.lock().clone();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].mailbox, [0xBB; 20]);
        assert_eq!(received[0].height, 850);
        assert_eq!(received[0].receipt, receipt);
        assert_eq!(received[0].encoded_proof, decode_hex(ENCODED_PROOF).unwrap());
        assert!(relay.sink.operations().is_empty());
    }

    #[tokio::test]
    async fn test_send_carries_registered_wire_ids() {
        let relay = Relay::new(MockMailboxContract::default(), MockProofRpc::default());
        relay
            .mailbox
            .send_message("a", &["b"], &["0x02"], 9, &[0xFF])
            .await
            .unwrap();

        let sent = relay.contract.sent.lock().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].mailbox, [0xAA; 20]);
        assert_eq!(sent[0].app_ids_to, vec![pad_identifier("300").unwrap()]);
        assert_eq!(sent[0].recipients, vec![pad_identifier("0x02").unwrap()]);
        assert_eq!(sent[0].nonce, 9);
        assert_eq!(sent[0].data, vec![0xFF]);
    }

    #[tokio::test]
    async fn test_zk_source_delivers_sparse_proof() {
        let relay = Relay::new(MockMailboxContract::default(), MockProofRpc::default());
        let receipt = relay.return_receipt(1);
        let slot = slot_of(&receipt);
        assert_eq!(slot, parse_hash(RETURN_SLOT).unwrap());

        let outcome = relay
            .verifier_b()
            .receive_message(850, &receipt, ZkRollupArgs::new(slot))
            .await
            .unwrap();
        assert_eq!(outcome.app_id, "a");
        assert_eq!(relay.rpc.recorded()[0].account, [0xBB; 20]);

        let message = relay.contract.received.lock()[0].clone();
        assert_eq!(message.mailbox, [0xAA; 20]);
        assert_eq!(message.encoded_proof, decode_hex(RETURN_PROOF).unwrap());

        let proof = decode_proof_bytes(&message.encoded_proof, ProofLayout::SparseMerkle).unwrap();
        assert_eq!(proof.at_height, 850);
        assert_eq!(proof.account, [0xBB; 20]);
        assert_eq!(proof.key, slot);
        assert_eq!(proof.value, MockProofRpc::value_word());
        assert_eq!(proof.path, vec![[1u8; 32], [2u8; 32], [3u8; 32]]);
        assert_eq!(proof.index, 7);
    }

    #[tokio::test]
    async fn test_multicast_receipt_delivered_to_named_destination() {
        let relay = Relay::new(MockMailboxContract::default(), patricia_rpc());
        let receipt = relay
            .mailbox
            .new_receipt("a", &["b", "c"], &[0x01], "0x01", &["0x02", "0x03"], 2)
            .unwrap();

        let unnamed = relay
            .verifier_a()
            .receive_message(850, &receipt, EvmL1Args::default())
            .await;
        assert!(matches!(unnamed, Err(RelayError::UnresolvedDestination(_))));
        assert!(relay.rpc.recorded().is_empty());

        let outcome = relay
            .verifier_a()
            .receive_message(850, &receipt, EvmL1Args::default().to("c"))
            .await
            .unwrap();
        assert_eq!(outcome.app_id, "c");
        assert_eq!(relay.rpc.recorded()[0].account, [0xAA; 20]);
        assert_eq!(relay.contract.received.lock()[0].mailbox, [0xCC; 20]);
    }

    // =============================================================================
    // DISPATCH
    // =============================================================================

    #[tokio::test]
    async fn test_dispatch_by_entry_kind() {
        let relay = Relay::new(MockMailboxContract::default(), MockProofRpc::default());
        let receipt = relay.return_receipt(1);
        let slot = slot_of(&receipt);

        let b = Verifier::for_entry(
            relay.entry("b"),
            relay.rpc.clone(),
            relay.mailbox.clone(),
            VerifierOptions::for_kind(ChainKind::ZkRollupL2),
        )
        .unwrap();
        assert_eq!(b.kind(), ChainKind::ZkRollupL2);

        let mismatch = b
            .receive_message(850, &receipt, ProofArgs::EvmL1(EvmL1Args::default()))
            .await;
        assert!(matches!(mismatch, Err(RelayError::ProofArgsMismatch { .. })));
        assert_eq!(relay.contract.call_count(), 0);

        let outcome = b
            .receive_message(850, &receipt, ProofArgs::ZkRollup(ZkRollupArgs::new(slot)))
            .await
            .unwrap();
        assert_eq!(outcome.storage_slot, slot);
        assert_eq!(outcome.app_id, "a");
    }

    #[tokio::test]
    async fn test_evm_source_encodes_patricia_witness() {
        let relay = Relay::new(MockMailboxContract::default(), patricia_rpc());
        let receipt = relay.receipt(4);

        let a = Verifier::for_entry(
            relay.entry("a"),
            relay.rpc.clone(),
            relay.mailbox.clone(),
            VerifierOptions::for_kind(ChainKind::EvmL1),
        )
        .unwrap();
        a.receive_message(120, &receipt, ProofArgs::EvmL1(EvmL1Args::default()))
            .await
            .unwrap();

        let received = relay.contract.received.lock()[0].clone();
        assert_eq!(received.mailbox, [0xBB; 20]);
        let proof =
            decode_proof_bytes(&received.encoded_proof, ProofLayout::MerklePatricia).unwrap();
        assert_eq!(proof.account, [0xAA; 20]);
        assert_eq!(proof.witness.len(), 2);
        assert_eq!(proof.key, slot_of(&receipt));
        assert_eq!(proof.at_height, 120);
    }

    // =============================================================================
    // FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_revert_surfaces_and_is_reported() {
        let contract = MockMailboxContract {
            revert_reason: Some("invalid proof".to_string()),
            ..MockMailboxContract::default()
        };
        let relay = Relay::new(contract, MockProofRpc::default());
        let receipt = relay.return_receipt(1);
        let slot = slot_of(&receipt);

        let result = relay
            .verifier_b()
            .receive_message(850, &receipt, ZkRollupArgs::new(slot))
            .await;
        assert!(matches!(result, Err(RelayError::DestinationRejected(ref r)) if r == "invalid proof"));
        assert_eq!(relay.sink.operations(), vec!["receive_message".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_proof_never_reaches_mailbox() {
        let mut rpc = MockProofRpc::default();
        rpc.fail_with = Some("missing trie node".to_string());
        let relay = Relay::new(MockMailboxContract::default(), rpc);
        let receipt = relay.return_receipt(1);
        let slot = slot_of(&receipt);

        let result = relay
            .verifier_b()
            .receive_message(850, &receipt, ZkRollupArgs::new(slot))
            .await;
        assert!(matches!(
            result,
            Err(RelayError::ProofNotFound { height: 850, .. })
        ));
        assert_eq!(relay.contract.call_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_storage_key_never_fetches() {
        let relay = Relay::new(MockMailboxContract::default(), patricia_rpc());
        let receipt = relay.receipt(1);

        let result = relay
            .verifier_a()
            .receive_message(850, &receipt, EvmL1Args::with_storage_key([0x99; 32]))
            .await;
        assert!(matches!(result, Err(RelayError::StorageKeyMismatch { .. })));
        assert!(relay.rpc.recorded().is_empty());
        assert_eq!(relay.contract.call_count(), 0);
    }

    #[test]
    fn test_unregistered_destination_rejected_before_network() {
        let relay = Relay::new(MockMailboxContract::default(), MockProofRpc::default());
        let result = relay
            .mailbox
            .new_receipt("a", &["d"], &[], "0x01", &["0x02"], 1);
        assert!(matches!(result, Err(RelayError::UnknownAppId(_))));
        assert_eq!(relay.contract.call_count(), 0);
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[tokio::test]
    async fn test_concurrent_deliveries_are_independent() {
        let relay = Relay::new(MockMailboxContract::default(), MockProofRpc::default());
        let verifier = Arc::new(relay.verifier_b());

        let receipts: Vec<Receipt> = (1..=16).map(|nonce| relay.return_receipt(nonce)).collect();
        let outcomes = join_all(receipts.iter().map(|receipt| {
            let verifier = verifier.clone();
            let slot = slot_of(receipt);
            async move {
                verifier
                    .receive_message(900, receipt, ZkRollupArgs::new(slot))
                    .await
            }
        }))
        .await;

        for (receipt, outcome) in receipts.iter().zip(&outcomes) {
            assert_eq!(outcome.as_ref().unwrap().storage_slot, slot_of(receipt));
        }
        let received = relay.contract.received.lock().clone();
        assert_eq!(received.len(), 16);
        for message in &received {
            let proof = decode_proof_bytes(&message.encoded_proof, ProofLayout::SparseMerkle)
                .unwrap();
            assert_eq!(proof.key, slot_of(&message.receipt));
        }

        let mut slots: Vec<_> = receipts.iter().map(slot_of).collect();
        slots.sort();
        slots.dedup();
        assert_eq!(slots.len(), 16);
    }
}
