//! # O Pipeline de Conversão
//!
//! Amarra os estágios na ordem fixa: anotação → alinhamento → fusão →
//! classificação → registro. O [`Converter`] processa um par por vez; o
//! lote ([`Converter::convert_batch`]) despacha os pares em sequência ou
//! num pool de workers `rayon`, sempre devolvendo os registros **na ordem
//! de entrada**.
//!
//! ## Isolamento de falhas
//!
//! Uma falha de anotação condena só o par ofensor: ele é pulado, o
//! diagnóstico (com os dois textos) vai para a lista de pulados e o
//! processamento continua. Erros de lógica do núcleo não existem como
//! condição de runtime: alinhador, fusor e classificador são funções
//! totais.
//!
//! ## Cancelamento
//!
//! O [`CancelToken`] é um `AtomicBool` compartilhado, consultado antes de
//! cada par. Pares em voo terminam; os restantes nem começam. Os registros
//! já prontos permanecem válidos.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aligner::{align, AlignmentMode};
use crate::classifier::classify;
use crate::m2::{format_record, FormatOptions};
use crate::merger::{merge, Edit, MergePolicy};
use crate::resources::LexicalResources;
use crate::token::{detokenize, AnnotatedSentence, AnnotationError, AnnotationProvider};

/// Opções de conversão de um lote inteiro.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub mode: AlignmentMode,
    pub policy: MergePolicy,
    /// Delimitador dos traços por token nas linhas `S`/`T`.
    pub feature_delimiter: Option<String>,
    /// A entrada original já vem tokenizada por espaço? Então detokeniza
    /// antes de anotar.
    pub detokenize_orig: bool,
    /// Idem para o lado corrigido.
    pub detokenize_cor: bool,
    pub coder_id: u32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            mode: AlignmentMode::default(),
            policy: MergePolicy::default(),
            feature_delimiter: None,
            detokenize_orig: false,
            detokenize_cor: false,
            coder_id: 0,
        }
    }
}

/// O resultado de um par: as duas sentenças anotadas e as edições
/// classificadas, ordenadas por `orig_start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRecord {
    pub orig: AnnotatedSentence,
    pub cor: AnnotatedSentence,
    pub edits: Vec<Edit>,
    /// Sentenças idênticas após o trim: o registro sai com o sentinela.
    pub noop: bool,
}

impl SentenceRecord {
    /// Renderiza o registro no formato M2.
    pub fn to_m2(&self, opts: &FormatOptions) -> String {
        format_record(&self.orig, &self.cor, &self.edits, self.noop, opts)
    }
}

/// Sinal cooperativo de cancelamento, compartilhado entre os workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Diagnóstico de um par pulado por falha de anotação.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedPair {
    /// Posição do par na entrada (base zero).
    pub index: usize,
    pub orig: String,
    pub cor: String,
    pub reason: String,
}

/// Contagem final de um lote, própria para o relatório do operador.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub converted: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

/// Saída completa de um lote: registros na ordem de entrada (pares pulados
/// são omitidos) mais a contabilidade.
#[derive(Debug)]
pub struct BatchOutcome {
    pub records: Vec<SentenceRecord>,
    pub skipped: Vec<SkippedPair>,
    pub cancelled: bool,
    /// Quantos pares havia na entrada, incluindo os não iniciados.
    pub total: usize,
}

impl BatchOutcome {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.total,
            converted: self.records.len(),
            skipped: self.skipped.len(),
            cancelled: self.cancelled,
        }
    }
}

/// Resultado interno de um par dentro do lote.
enum PairOutcome {
    Done(SentenceRecord),
    Skipped(SkippedPair),
    /// Cancelamento chegou antes deste par.
    NotStarted,
}

/// O conversor: um provedor de anotação, os recursos compartilhados e as
/// opções do lote. Os recursos são somente-leitura e compartilhados por
/// todos os workers via `Arc`.
pub struct Converter<P: AnnotationProvider> {
    provider: P,
    resources: Arc<LexicalResources>,
    options: ConvertOptions,
}

impl<P: AnnotationProvider> Converter<P> {
    pub fn new(provider: P, resources: Arc<LexicalResources>, options: ConvertOptions) -> Self {
        Self { provider, resources, options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Converte um par de sentenças cruas em um registro.
    ///
    /// Sentenças idênticas após o trim (e a detokenização opcional) nem
    /// passam pelo alinhador: o registro sai marcado como `noop`.
    pub fn convert_pair(&self, orig_raw: &str, cor_raw: &str) -> Result<SentenceRecord, AnnotationError> {
        let orig_text = self.prepare(orig_raw, self.options.detokenize_orig);
        let cor_text = self.prepare(cor_raw, self.options.detokenize_cor);

        if orig_text == cor_text {
            let orig = self.provider.annotate(&orig_text)?;
            let cor = orig.clone();
            return Ok(SentenceRecord { orig, cor, edits: Vec::new(), noop: true });
        }

        let orig = self.provider.annotate(&orig_text)?;
        let cor = self.provider.annotate(&cor_text)?;

        let ops = align(&orig, &cor, self.options.mode);
        let mut edits = merge(&ops, &orig, &cor, self.options.policy);
        for edit in &mut edits {
            edit.category = classify(edit, &orig, &cor, &self.resources);
        }
        Ok(SentenceRecord { orig, cor, edits, noop: false })
    }

    fn prepare(&self, raw: &str, detok: bool) -> String {
        let trimmed = raw.trim();
        if detok {
            let toks: Vec<&str> = trimmed.split_whitespace().collect();
            detokenize(&toks)
        } else {
            trimmed.to_string()
        }
    }

    /// Converte um lote de pares, preservando a ordem de entrada.
    ///
    /// `jobs <= 1` roda em sequência; acima disso, um pool `rayon` com o
    /// número pedido de threads. A coleta do `par_iter` preserva a ordem
    /// dos índices, então a saída independe do entrelaçamento dos workers.
    pub fn convert_batch(
        &self,
        pairs: &[(String, String)],
        jobs: usize,
        cancel: &CancelToken,
    ) -> BatchOutcome {
        let outcomes: Vec<PairOutcome> = if jobs <= 1 {
            pairs
                .iter()
                .enumerate()
                .map(|(i, pair)| self.process_one(i, pair, cancel))
                .collect()
        } else {
            match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => pool.install(|| {
                    pairs
                        .par_iter()
                        .enumerate()
                        .map(|(i, pair)| self.process_one(i, pair, cancel))
                        .collect()
                }),
                // Sem pool, o lote ainda sai: roda em sequência.
                Err(_) => pairs
                    .iter()
                    .enumerate()
                    .map(|(i, pair)| self.process_one(i, pair, cancel))
                    .collect(),
            }
        };

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                PairOutcome::Done(record) => records.push(record),
                PairOutcome::Skipped(diag) => skipped.push(diag),
                PairOutcome::NotStarted => {}
            }
        }
        BatchOutcome {
            records,
            skipped,
            cancelled: cancel.is_cancelled(),
            total: pairs.len(),
        }
    }

    /// Converte um lote inteiro, sem cancelamento externo.
    ///
    /// Conveniência para chamadores que não têm de onde sinalizar uma
    /// interrupção (o binário de linha de comando, por exemplo); quem tem,
    /// usa [`Converter::convert_batch`] com o próprio token.
    pub fn convert_all(&self, pairs: &[(String, String)], jobs: usize) -> BatchOutcome {
        self.convert_batch(pairs, jobs, &CancelToken::new())
    }

    fn process_one(&self, index: usize, pair: &(String, String), cancel: &CancelToken) -> PairOutcome {
        if cancel.is_cancelled() {
            return PairOutcome::NotStarted;
        }
        match self.convert_pair(&pair.0, &pair.1) {
            Ok(record) => PairOutcome::Done(record),
            Err(err) => PairOutcome::Skipped(SkippedPair {
                index,
                orig: pair.0.clone(),
                cor: pair.1.clone(),
                reason: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::HeuristicAnnotator;
    use crate::m2::NOOP_EDIT_LINE;

    fn converter(options: ConvertOptions) -> Converter<HeuristicAnnotator> {
        let resources = Arc::new(LexicalResources::builtin());
        let provider = HeuristicAnnotator::new(Arc::clone(&resources));
        Converter::new(provider, resources, options)
    }

    fn pair(o: &str, c: &str) -> (String, String) {
        (o.to_string(), c.to_string())
    }

    #[test]
    fn test_end_to_end_verb_agreement() {
        let conv = converter(ConvertOptions::default());
        let record = conv
            .convert_pair("She go to school .", "She goes to school .")
            .unwrap();
        assert!(!record.noop);
        assert_eq!(record.edits.len(), 1);
        let edit = &record.edits[0];
        assert_eq!((edit.orig_start, edit.orig_end), (1, 2));
        assert_eq!(edit.orig_text, "go");
        assert_eq!(edit.cor_text, "goes");
        assert_eq!(edit.category, "VERB:SVA");
    }

    #[test]
    fn test_identical_pair_is_noop_sentinel() {
        let conv = converter(ConvertOptions::default());
        let record = conv
            .convert_pair("  Nothing wrong here .  ", "Nothing wrong here .")
            .unwrap();
        assert!(record.noop);
        assert!(record.edits.is_empty());
        let m2 = record.to_m2(&FormatOptions::default());
        assert!(m2.ends_with(NOOP_EDIT_LINE));
    }

    #[test]
    fn test_detokenization_flag_reattaches_clitics() {
        let options = ConvertOptions {
            detokenize_orig: true,
            detokenize_cor: true,
            ..ConvertOptions::default()
        };
        let conv = converter(options);
        // Os dois lados detokenizam para o mesmo texto: noop.
        let record = conv.convert_pair("I do n't know .", "I don't know .").unwrap();
        assert!(record.noop);
    }

    #[test]
    fn test_batch_preserves_order_and_skips_failures() {
        let conv = converter(ConvertOptions::default());
        let pairs = vec![
            pair("She go home .", "She goes home ."),
            // U+FFFD: o anotador recusa e o par é pulado.
            pair("bad \u{FFFD} input", "bad input"),
            pair("He eat the cake .", "He ate the cake ."),
        ];
        let cancel = CancelToken::new();
        let outcome = conv.convert_batch(&pairs, 1, &cancel);

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].edits[0].orig_text, "go");
        assert_eq!(outcome.records[1].edits[0].orig_text, "eat");
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].index, 1);
        assert!(!outcome.cancelled);

        let summary = outcome.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.converted, 2);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_parallel_batch_matches_sequential() {
        let pairs = vec![
            pair("She go home .", "She goes home ."),
            pair("Nothing here .", "Nothing here ."),
            pair("He eat the cake .", "He ate the cake ."),
            pair("I has a cat .", "I have a cat ."),
        ];
        let cancel = CancelToken::new();
        let sequential = converter(ConvertOptions::default()).convert_batch(&pairs, 1, &cancel);
        let parallel = converter(ConvertOptions::default()).convert_batch(&pairs, 2, &cancel);
        assert_eq!(sequential.records, parallel.records);
        assert_eq!(sequential.summary(), parallel.summary());
    }

    #[test]
    fn test_convert_all_runs_without_external_token() {
        let conv = converter(ConvertOptions::default());
        let pairs = vec![pair("She go home .", "She goes home .")];
        let outcome = conv.convert_all(&pairs, 1);
        assert_eq!(outcome.summary().converted, 1);
        assert!(!outcome.cancelled);
    }

    #[test]
    fn test_cancellation_stops_before_any_pair() {
        let conv = converter(ConvertOptions::default());
        let pairs = vec![pair("She go home .", "She goes home .")];
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = conv.convert_batch(&pairs, 1, &cancel);
        assert!(outcome.cancelled);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.summary().converted, 0);
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let summary = BatchSummary { total: 10, converted: 8, skipped: 2, cancelled: false };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"converted\":8"));
        let back: BatchSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
