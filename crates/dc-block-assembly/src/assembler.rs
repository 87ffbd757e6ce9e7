//! Template orchestration.

use crate::config::AssemblerConfig;
use crate::error::{AssemblyError, Result};
use crate::gate::AdmissionGate;
use crate::policy::SigOpPolicy;
use crate::ports::{ChainView, DagView, RespendDetector, TemplateValidator};
use crate::proofbase::ProofbaseBuilder;
use crate::state::CandidateBlockState;
use crate::strategy::{add_package_txs, add_priority_txs, add_score_txs};
use dc_mempool::TransactionPool;
use parking_lot::RwLock;
use shared_types::{numeric_txid_cmp, Amount, BlockHeader, SubBlock, Transaction};
use std::time::Instant;

/// A completed candidate template.
///
/// The fee and sigop vectors run parallel to the block's transaction
/// list. Slot 0 is the proofbase: its fee entry is the negative of all
/// collected fees (the amount the proofbase may claim) and its sigop
/// entry is zero.
#[derive(Clone, Debug)]
pub struct SubBlockTemplate {
    /// The assembled sub-block, proofbase first.
    pub block: SubBlock,
    /// Per-transaction fees, parallel to the block's transactions.
    pub tx_fees: Vec<Amount>,
    /// Per-transaction sigop counts, parallel to the block's transactions.
    pub tx_sigops: Vec<u64>,
}

/// Builds candidate sub-blocks from the pool.
///
/// One assembler serves many template requests; everything per-template
/// lives in a fresh [`CandidateBlockState`].
pub struct SubBlockAssembler<'a> {
    config: AssemblerConfig,
    chain: &'a dyn ChainView,
    dag: &'a dyn DagView,
    respend: &'a dyn RespendDetector,
    validator: &'a dyn TemplateValidator,
}

impl<'a> SubBlockAssembler<'a> {
    /// Creates an assembler. The configuration is normalized so the
    /// relative size knobs cannot contradict each other.
    pub fn new(
        config: AssemblerConfig,
        chain: &'a dyn ChainView,
        dag: &'a dyn DagView,
        respend: &'a dyn RespendDetector,
        validator: &'a dyn TemplateValidator,
    ) -> Self {
        Self {
            config: config.normalized(),
            chain,
            dag,
            respend,
            validator,
        }
    }

    /// Builds one candidate template on top of the current tip.
    ///
    /// Selection runs under the pool's read lock; proofbase assembly,
    /// header construction and external validation happen after it is
    /// released. A `proofbase_reserve` overrides the configured
    /// reservation for this request only.
    ///
    /// # Errors
    /// - [`AssemblyError::ReserveTooLarge`] when the proofbase
    ///   reservation alone exceeds the block size cap
    /// - [`AssemblyError::ValidationFailed`] when the finished candidate
    ///   fails external consensus validation
    #[tracing::instrument(skip_all, fields(use_cpfp = self.config.use_cpfp))]
    pub fn create_candidate(
        &self,
        pool: &RwLock<TransactionPool>,
        payout_script: Vec<u8>,
        proofbase_reserve: Option<u64>,
    ) -> Result<SubBlockTemplate> {
        let builder = ProofbaseBuilder::new(payout_script, self.config.miner_comment.clone());
        let frontier = self.dag.frontier();
        let min_tx_size_active = self.chain.min_tx_size_active();

        let reserved = builder.reserve_size(
            &frontier,
            proofbase_reserve,
            &self.config,
            min_tx_size_active,
        );
        if reserved > self.config.max_block_size {
            return Err(AssemblyError::ReserveTooLarge {
                reserve: reserved,
                max_block_size: self.config.max_block_size,
            });
        }

        let height = self.chain.tip_height() + 1;
        let lock_time_cutoff = self.chain.median_time_past();
        let policy = SigOpPolicy::for_chain(self.chain, self.config.max_sigchecks);

        let mut state = CandidateBlockState::new(reserved, crate::PROOFBASE_SIGOPS_RESERVE);
        let mut selected = Vec::new();

        // Selection holds the read lock for the whole pass so every
        // strategy sees one consistent pool snapshot.
        let chosen: Vec<(Transaction, Amount, u64)> = {
            let pool = pool.read();
            let gate = AdmissionGate::new(
                &self.config,
                policy,
                height,
                lock_time_cutoff,
                self.chain.now_micros(),
                min_tx_size_active,
                self.respend,
            );

            add_priority_txs(
                &pool,
                &gate,
                &mut state,
                &mut selected,
                self.config.priority_size,
                self.config.max_block_size,
            );

            if self.config.use_cpfp {
                let start = Instant::now();
                let scan = add_package_txs(&pool, &gate, &mut state, &mut selected, &self.config);
                crate::metrics::global().record_package_pass(start.elapsed().as_micros() as u64);
                tracing::debug!(
                    considered = scan.considered,
                    failures = scan.failures,
                    "package pass done"
                );
            } else {
                let start = Instant::now();
                add_score_txs(&pool, &gate, &mut state, &mut selected);
                crate::metrics::global().record_score_pass(start.elapsed().as_micros() as u64);
            }

            tracing::info!(
                height,
                tx_count = state.tx_count,
                block_size = state.block_size,
                sig_ops = state.sig_ops,
                fees = state.fees,
                "candidate selected"
            );

            // Canonical template order is numeric txid, not selection
            // order; within a block dependencies carry no order.
            selected.sort_by(|a, b| numeric_txid_cmp(a, b));
            selected
                .iter()
                .filter_map(|txid| {
                    pool.get(txid)
                        .map(|entry| (entry.tx.clone(), entry.fee, entry.sigops))
                })
                .collect()
        };

        let mut transactions = Vec::with_capacity(chosen.len() + 1);
        let mut tx_fees = Vec::with_capacity(chosen.len() + 1);
        let mut tx_sigops = Vec::with_capacity(chosen.len() + 1);
        transactions.push(builder.build(&frontier, min_tx_size_active));
        tx_fees.push(-state.fees);
        tx_sigops.push(0);
        for (tx, fee, sigops) in chosen {
            transactions.push(tx);
            tx_fees.push(fee);
            tx_sigops.push(sigops);
        }

        let mut header = BlockHeader {
            version: self.chain.block_version(),
            prev_block: self.chain.tip_hash(),
            merkle_root: [0u8; 32],
            time: 0,
            bits: self.chain.next_work_required(),
            nonce: 0,
        };
        crate::mining::update_time(&mut header, self.chain);

        let mut block = SubBlock {
            header,
            transactions,
        };
        block.header.merkle_root = block.merkle_root();

        crate::metrics::global().record_template(state.tx_count + 1, state.block_size);

        self.validator
            .test_validity(&block)
            .map_err(|reason| AssemblyError::ValidationFailed { reason })?;

        Ok(SubBlockTemplate {
            block,
            tx_fees,
            tx_sigops,
        })
    }
}
