//! # gec-core — Anotação Automática de Edições em Formato M2
//!
//! Este crate converte pares de sentenças (original / corrigida) em registros
//! M2: para cada par, localiza o conjunto mínimo de diferenças entre tokens e
//! atribui a cada diferença um rótulo de tipo de erro linguisticamente
//! motivado, sem anotação humana.
//!
//! ## Arquitetura do Sistema
//!
//! O sistema segue uma arquitetura de pipeline linear, onde o par de
//! sentenças flui e é transformado passo a passo:
//!
//! 1.  **Entrada**: Par de sentenças cruas (original, corrigida).
//! 2.  **Anotação** ([`annotator`]): Cada sentença é tokenizada e enriquecida
//!     com lema, classe gramatical e dependências via [`AnnotationProvider`].
//! 3.  **Alinhamento** ([`aligner`]): Damerau-Levenshtein ponderado produz as
//!     operações elementares (match, substituição, inserção, deleção,
//!     transposição) entre as duas sequências de tokens.
//! 4.  **Fusão** ([`merger`]): As operações viram edições conforme a política
//!     escolhida (`rules`, `all-split`, `all-merge`, `all-equal`), já
//!     minimizadas.
//! 5.  **Classificação** ([`classifier`]): Cada edição recebe a categoria de
//!     erro pela tabela ordenada de regras.
//! 6.  **Saída** ([`m2`]): Registros textuais `S`/`T`/`A`, um por par.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::sync::Arc;
//! use gec_core::{
//!     Converter, ConvertOptions, HeuristicAnnotator, LexicalResources,
//! };
//! use gec_core::m2::FormatOptions;
//!
//! // 1. Carrega os recursos embutidos e o anotador heurístico
//! let resources = Arc::new(LexicalResources::builtin());
//! let provider = HeuristicAnnotator::new(Arc::clone(&resources));
//! let converter = Converter::new(provider, resources, ConvertOptions::default());
//!
//! // 2. Converte um par de sentenças
//! let record = converter
//!     .convert_pair("She go to school .", "She goes to school .")
//!     .unwrap();
//!
//! // 3. Renderiza o registro M2
//! println!("{}", record.to_m2(&FormatOptions::default()));
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: Orquestrador que conecta todos os estágios, com lote
//!   sequencial ou paralelo.
//! - [`token`]: Tipos de token anotado e o contrato do provedor de anotação.
//! - [`resources`]: Lista de palavras, tag map e stemmer compartilhados.

pub mod aligner;
pub mod annotator;
pub mod classifier;
pub mod m2;
pub mod merger;
pub mod pipeline;
pub mod resources;
pub mod token;

pub use aligner::{align, AlignmentMode, ElementaryOp, OpKind};
pub use annotator::HeuristicAnnotator;
pub use classifier::classify;
pub use merger::{merge, Edit, MergePolicy};
pub use pipeline::{
    BatchOutcome, BatchSummary, CancelToken, ConvertOptions, Converter, SentenceRecord,
    SkippedPair,
};
pub use resources::{LexicalResources, ResourceError};
pub use token::{
    detokenize, AnnotatedSentence, AnnotatedToken, AnnotationError, AnnotationProvider,
};
