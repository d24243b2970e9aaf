//! # Mailbox Client
//!
//! Builds canonical receipts and dispatches send/receive calls to the mailbox
//! contract of the chain an app id resolves to.

use crate::algorithms::{pad_identifier, pad_identifiers};
use crate::application::registry::ChainRegistry;
use crate::domain::{
    invariant_mailbox_present, ChainEntry, EncodedProof, Hash, Receipt, RelayError, TxReceipt,
};
use crate::ports::outbound::{ErrorSink, MailboxContract};
use std::sync::Arc;
use tracing::{debug, info};

/// Message lifecycle orchestrator.
pub struct MailboxClient<M: MailboxContract> {
    registry: Arc<ChainRegistry>,
    contract: Arc<M>,
    sink: Arc<dyn ErrorSink>,
}

impl<M: MailboxContract> MailboxClient<M> {
    /// Create a client over a registry, a mailbox transport and an error sink.
    pub fn new(registry: Arc<ChainRegistry>, contract: Arc<M>, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            registry,
            contract,
            sink,
        }
    }

    /// Registry used for resolution.
    pub fn registry(&self) -> &Arc<ChainRegistry> {
        &self.registry
    }

    /// Sink failures are reported to.
    pub fn error_sink(&self) -> &Arc<dyn ErrorSink> {
        &self.sink
    }

    fn reported<T>(&self, operation: &str, result: Result<T, RelayError>) -> Result<T, RelayError> {
        if let Err(e) = &result {
            self.sink.report(operation, e);
        }
        result
    }

    /// Build a receipt with every identifier padded to 32 bytes.
    ///
    /// App ids are replaced by their registered wire ids; an unregistered app
    /// id fails with `UnknownAppId` before any network call. `from` and `to`
    /// are padded as given.
    pub fn new_receipt<S: AsRef<str>>(
        &self,
        app_id_from: &str,
        app_ids_to: &[S],
        data: &[u8],
        from: &str,
        to: &[S],
        nonce: u64,
    ) -> Result<Receipt, RelayError> {
        let result = self.build_receipt(app_id_from, app_ids_to, data, from, to, nonce);
        self.reported("new_receipt", result)
    }

    fn build_receipt<S: AsRef<str>>(
        &self,
        app_id_from: &str,
        app_ids_to: &[S],
        data: &[u8],
        from: &str,
        to: &[S],
        nonce: u64,
    ) -> Result<Receipt, RelayError> {
        let app_id_from = self.registry.wire_id(app_id_from)?;
        let app_id_to = self.wire_ids(app_ids_to)?;
        Ok(Receipt::new(
            app_id_from,
            app_id_to,
            data.to_vec(),
            pad_identifier(from)?,
            pad_identifiers(to)?,
            nonce,
        ))
    }

    fn wire_ids<S: AsRef<str>>(&self, app_ids: &[S]) -> Result<Vec<Hash>, RelayError> {
        app_ids
            .iter()
            .map(|id| self.registry.wire_id(id.as_ref()))
            .collect()
    }

    /// Registered chain a receipt is delivered to.
    ///
    /// A `requested` app id must be one of the receipt's destinations.
    /// Without one, exactly one of the receipt's destinations must be
    /// registered; none or several fail with `UnresolvedDestination`.
    pub fn resolve_destination(
        &self,
        receipt: &Receipt,
        requested: Option<&str>,
    ) -> Result<ChainEntry, RelayError> {
        if let Some(app_id) = requested {
            let entry = self.registry.resolve(app_id)?;
            let wire_id = self.registry.wire_id(app_id)?;
            if !receipt.app_id_to().contains(&wire_id) {
                return Err(RelayError::UnresolvedDestination(format!(
                    "{} is not addressed by the receipt",
                    app_id
                )));
            }
            return Ok(entry);
        }

        let mut candidates: Vec<ChainEntry> = receipt
            .app_id_to()
            .iter()
            .flat_map(|wire_id| self.registry.find_by_wire_id(wire_id))
            .collect();
        candidates.sort_by(|a, b| a.app_id.cmp(&b.app_id));
        candidates.dedup_by(|a, b| a.app_id == b.app_id);
        match candidates.len() {
            1 => Ok(candidates.remove(0)),
            0 => Err(RelayError::UnresolvedDestination(
                "no registered chain is addressed by the receipt".to_string(),
            )),
            n => Err(RelayError::UnresolvedDestination(format!(
                "{} registered chains are addressed by the receipt; name one",
                n
            ))),
        }
    }

    /// Send a message through `app_id_from`'s mailbox. Returns the tx hash.
    ///
    /// Nonces are not serialised here. Callers sending from the same account
    /// on the same chain must order their calls themselves.
    pub async fn send_message<S: AsRef<str>>(
        &self,
        app_id_from: &str,
        app_ids_to: &[S],
        to: &[S],
        nonce: u64,
        data: &[u8],
    ) -> Result<Hash, RelayError> {
        let result = async {
            let entry = self.registry.resolve(app_id_from)?;
            let mailbox = invariant_mailbox_present(&entry)?;
            let app_ids_to = self.wire_ids(app_ids_to)?;
            let recipients = pad_identifiers(to)?;

            debug!(
                app_id = app_id_from,
                destinations = app_ids_to.len(),
                nonce,
                "[nexus-relay] sendMessage"
            );
            let tx_hash = self
                .contract
                .send_message(mailbox, &app_ids_to, &recipients, nonce, data)
                .await?
                .into_confirmed()?;
            info!(
                app_id = app_id_from,
                nonce,
                tx = %hex::encode(tx_hash),
                "[nexus-relay] Message sent"
            );
            Ok::<_, RelayError>(tx_hash)
        }
        .await;
        self.reported("send_message", result)
    }

    /// Submit a receipt and its encoded proof to `app_id`'s mailbox.
    ///
    /// A reverted transaction is returned as a reverted `TxReceipt`, not an
    /// error.
    pub async fn receive_message(
        &self,
        app_id: &str,
        at_height: u64,
        receipt: &Receipt,
        proof: &EncodedProof,
    ) -> Result<TxReceipt, RelayError> {
        let result = self.submit(app_id, at_height, receipt, proof).await;
        self.reported("receive_message", result)
    }

    pub(crate) async fn submit(
        &self,
        app_id: &str,
        at_height: u64,
        receipt: &Receipt,
        proof: &EncodedProof,
    ) -> Result<TxReceipt, RelayError> {
        let entry = self.registry.resolve(app_id)?;
        let mailbox = invariant_mailbox_present(&entry)?;
        debug!(
            app_id,
            height = at_height,
            proof_bytes = proof.as_bytes().len(),
            "[nexus-relay] receiveMessage"
        );
        self.contract
            .receive_message(mailbox, at_height, receipt, proof.as_bytes())
            .await
    }
}
