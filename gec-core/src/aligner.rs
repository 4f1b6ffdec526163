//! # Alinhador de Tokens — Damerau-Levenshtein com Custos Linguísticos
//!
//! Encontra o caminho de edição de custo mínimo entre a sentença original e a
//! corrigida via **programação dinâmica** sobre uma matriz `(m+1)×(n+1)`,
//! como no Viterbi: preenche a tabela para frente e reconstrói o caminho de
//! trás para frente com backpointers implícitos.
//!
//! ## Função de custo
//!
//! A substituição não custa um valor fixo: tokens que são variantes
//! morfológicas um do outro (mesmo lema, classe diferente) custam pouco, e
//! tokens sem relação custam caro. Isso faz o alinhador preferir parear
//! `go`/`goes` em vez de tratar o par como deleção + inserção.
//!
//! ```text
//! custo(sub) = lema(0 ou 0.5) + classe(0, 0.1 ou 0.25) + caracteres(0..0.5)
//! custo(ins) = custo(del) = 1.0
//! custo(transposição adjacente) = min(1.0, substituições cruzadas - ε)
//! ```
//!
//! ## Desempate do backtrace
//!
//! Quando mais de um caminho atinge o custo mínimo numa célula, a ordem de
//! preferência é fixa: Match > Transposição > Substituição > Inserção >
//! Deleção. Isso torna a saída determinística e reprodutível em teste.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::token::{AnnotatedSentence, AnnotatedToken};

/// Constantes de custo do alinhamento.
///
/// A forma (ordem relativa entre os custos) é fixa; os valores exatos são
/// parâmetros calibráveis contra um corpus de referência.
mod cost {
    /// Inserção ou deleção de um token.
    pub const INDEL: f64 = 1.0;
    /// Teto da transposição de um par adjacente. O custo efetivo fica
    /// sempre estritamente abaixo do caminho com as duas substituições
    /// cruzadas (ver `transpose_cost`), mesmo quando elas saem baratas por
    /// serem variantes do mesmo lema.
    pub const TRANSPOSE: f64 = 1.0;
    /// Parcela por lemas diferentes.
    pub const LEMMA: f64 = 0.5;
    /// Parcela por classes grossas diferentes, ambas de conteúdo.
    pub const POS_CONTENT: f64 = 0.1;
    /// Parcela por classes grossas diferentes, caso geral.
    pub const POS_OTHER: f64 = 0.25;
    /// Peso da distância de caracteres normalizada.
    pub const CHAR_WEIGHT: f64 = 0.5;
    /// Tolerância na comparação de custos no backtrace.
    pub const EPS: f64 = 1e-9;
}

/// Modo de alinhamento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentMode {
    /// Damerau-Levenshtein: transposição de par adjacente permitida (padrão).
    Damerau,
    /// Levenshtein padrão: sem transposição.
    Levenshtein,
}

impl Default for AlignmentMode {
    fn default() -> Self {
        AlignmentMode::Damerau
    }
}

/// Tipo de operação elementar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Match,
    Substitution,
    Insertion,
    Deletion,
    Transposition,
}

/// Uma operação elementar do alinhamento.
///
/// Os intervalos são semiabertos e indexam as sentenças respectivas; o lado
/// vazio de uma inserção/deleção tem início igual ao fim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementaryOp {
    pub kind: OpKind,
    pub orig_start: usize,
    pub orig_end: usize,
    pub cor_start: usize,
    pub cor_end: usize,
    pub cost: f64,
}

impl ElementaryOp {
    pub fn is_match(&self) -> bool {
        self.kind == OpKind::Match
    }
}

/// Alinha duas sentenças anotadas e devolve a sequência de operações
/// elementares, em ordem, cobrindo ambas as sentenças por completo.
///
/// Função total: todo par de sentenças tem pelo menos um alinhamento
/// (no pior caso, deleções seguidas de inserções).
pub fn align(
    orig: &AnnotatedSentence,
    cor: &AnnotatedSentence,
    mode: AlignmentMode,
) -> Vec<ElementaryOp> {
    let m = orig.len();
    let n = cor.len();

    // === Preenchimento da matriz de custos ===
    let mut dist = vec![vec![0.0f64; n + 1]; m + 1];
    for (i, row) in dist.iter_mut().enumerate() {
        row[0] = i as f64 * cost::INDEL;
    }
    for j in 0..=n {
        dist[0][j] = j as f64 * cost::INDEL;
    }

    for i in 1..=m {
        for j in 1..=n {
            let sub = dist[i - 1][j - 1] + substitution_cost(&orig.tokens[i - 1], &cor.tokens[j - 1]);
            let ins = dist[i][j - 1] + cost::INDEL;
            let del = dist[i - 1][j] + cost::INDEL;
            let mut best = sub.min(ins).min(del);
            if mode == AlignmentMode::Damerau && can_transpose(orig, cor, i, j) {
                best = best.min(dist[i - 2][j - 2] + transpose_cost(orig, cor, i, j));
            }
            dist[i][j] = best;
        }
    }

    // === Backtrace com ordem fixa de desempate ===
    let mut ops: Vec<ElementaryOp> = Vec::new();
    let mut i = m;
    let mut j = n;
    while i > 0 || j > 0 {
        let here = dist[i][j];

        if i > 0 && j > 0 && orig.tokens[i - 1].text == cor.tokens[j - 1].text
            && close(here, dist[i - 1][j - 1])
        {
            ops.push(op(OpKind::Match, i - 1, i, j - 1, j, 0.0));
            i -= 1;
            j -= 1;
            continue;
        }
        if mode == AlignmentMode::Damerau && can_transpose(orig, cor, i, j) {
            let t = transpose_cost(orig, cor, i, j);
            if close(here, dist[i - 2][j - 2] + t) {
                ops.push(op(OpKind::Transposition, i - 2, i, j - 2, j, t));
                i -= 2;
                j -= 2;
                continue;
            }
        }
        if i > 0 && j > 0 {
            let sub = substitution_cost(&orig.tokens[i - 1], &cor.tokens[j - 1]);
            if close(here, dist[i - 1][j - 1] + sub) {
                ops.push(op(OpKind::Substitution, i - 1, i, j - 1, j, sub));
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if j > 0 && close(here, dist[i][j - 1] + cost::INDEL) {
            ops.push(op(OpKind::Insertion, i, i, j - 1, j, cost::INDEL));
            j -= 1;
            continue;
        }
        // Resta a deleção; i > 0 garantido, senão a inserção teria casado.
        ops.push(op(OpKind::Deletion, i - 1, i, j, j, cost::INDEL));
        i -= 1;
    }

    ops.reverse();
    ops
}

fn op(kind: OpKind, os: usize, oe: usize, cs: usize, ce: usize, cost: f64) -> ElementaryOp {
    ElementaryOp {
        kind,
        orig_start: os,
        orig_end: oe,
        cor_start: cs,
        cor_end: ce,
        cost,
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < cost::EPS
}

/// Custo efetivo de fechar a transposição em `(i, j)`.
///
/// O caminho alternativo para uma troca adjacente é o par de substituições
/// cruzadas, que sai barato quando os tokens são variantes do mesmo lema.
/// A transposição precisa ganhar sempre, então seu custo é o teto fixo ou
/// uma fração abaixo do par cruzado, o que for menor.
fn transpose_cost(orig: &AnnotatedSentence, cor: &AnnotatedSentence, i: usize, j: usize) -> f64 {
    let crossed = substitution_cost(&orig.tokens[i - 2], &cor.tokens[j - 2])
        + substitution_cost(&orig.tokens[i - 1], &cor.tokens[j - 1]);
    cost::TRANSPOSE.min(crossed - cost::EPS)
}

/// O par `(i, j)` fecha uma transposição adjacente `A B` → `B A`?
fn can_transpose(orig: &AnnotatedSentence, cor: &AnnotatedSentence, i: usize, j: usize) -> bool {
    i >= 2
        && j >= 2
        && orig.tokens[i - 1].text == cor.tokens[j - 2].text
        && orig.tokens[i - 2].text == cor.tokens[j - 1].text
        && orig.tokens[i - 1].text != orig.tokens[i - 2].text
}

/// Custo de substituir um token pelo outro.
///
/// Zero para texto idêntico (vira Match no backtrace). Fora isso, soma as
/// parcelas de lema, classe grossa e distância de caracteres — variantes
/// morfológicas ficam baratas, trocas arbitrárias ficam caras.
pub fn substitution_cost(a: &AnnotatedToken, b: &AnnotatedToken) -> f64 {
    if a.text == b.text {
        return 0.0;
    }
    let lemma = if a.lemma == b.lemma { 0.0 } else { cost::LEMMA };
    let pos = if a.pos_coarse == b.pos_coarse {
        0.0
    } else if is_content_pos(&a.pos_coarse) && is_content_pos(&b.pos_coarse) {
        cost::POS_CONTENT
    } else {
        cost::POS_OTHER
    };
    let chars = cost::CHAR_WEIGHT * (1.0 - char_similarity(&a.text, &b.text));
    lemma + pos + chars
}

fn is_content_pos(pos: &str) -> bool {
    matches!(pos, "NOUN" | "VERB" | "ADJ" | "ADV")
}

/// Similaridade de caracteres em `[0, 1]`: 1 menos a distância de edição
/// normalizada, calculada sobre **grafemas** (não bytes) para não punir
/// acentos e composições unicode.
pub fn char_similarity(a: &str, b: &str) -> f64 {
    let ga: Vec<&str> = a.graphemes(true).collect();
    let gb: Vec<&str> = b.graphemes(true).collect();
    let longest = ga.len().max(gb.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - grapheme_distance(&ga, &gb) as f64 / longest as f64
}

/// Levenshtein simples sobre sequências de grafemas, com uma linha rolante.
fn grapheme_distance(a: &[&str], b: &[&str]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![i + 1];
        for (j, cb) in b.iter().enumerate() {
            let sub = prev[j] + usize::from(ca != cb);
            let ins = row[j] + 1;
            let del = prev[j + 1] + 1;
            row.push(sub.min(ins).min(del));
        }
        prev = row;
    }
    prev[b.len()]
}
