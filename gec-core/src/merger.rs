//! # Fusão de Operações Elementares em Edições
//!
//! Converte a sequência de operações do alinhador nas edições finais.
//! Operações `Match` nunca entram em edição nenhuma: elas encerram a corrida
//! atual e são descartadas. Dentro de cada corrida de não-matches, a política
//! de fusão escolhida decide o agrupamento:
//!
//! - `all-split`: nenhuma fusão; cada operação vira uma edição.
//! - `all-merge`: a corrida inteira vira uma única edição.
//! - `all-equal`: funde apenas operações consecutivas do mesmo tipo.
//! - `rules` (padrão): parte do `all-equal` e aplica exceções linguísticas —
//!   uma substituição encostada numa inserção/deleção de palavra funcional
//!   (determinante, preposição, auxiliar...) vira uma edição única, porque
//!   separá-las produz unidades de correção sem sentido.
//!
//! ## Minimização
//!
//! Depois da fusão, cada edição é aparada: tokens idênticos na frente e no
//! fim dos dois lados saem do intervalo, repetidamente, até não haver mais o
//! que aparar. `"was eaten" → "has eaten"` estreita para `"was" → "has"`.
//! Edição que minimiza para vazio dos dois lados é descartada.

use serde::{Deserialize, Serialize};

use crate::aligner::{ElementaryOp, OpKind};
use crate::token::{AnnotatedSentence, AnnotatedToken};

/// Política de fusão das operações elementares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Fusão guiada por regras linguísticas (padrão).
    Rules,
    /// Nenhuma fusão.
    AllSplit,
    /// Funde qualquer corrida de não-matches.
    AllMerge,
    /// Funde apenas operações consecutivas do mesmo tipo.
    AllEqual,
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy::Rules
    }
}

/// Uma edição: intervalo do lado original, intervalo do lado corrigido e a
/// categoria de erro (vazia até o classificador preencher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub orig_start: usize,
    pub orig_end: usize,
    /// Categoria de erro; `""` até a classificação.
    pub category: String,
    pub orig_text: String,
    pub cor_text: String,
    pub cor_start: usize,
    pub cor_end: usize,
}

impl Edit {
    /// Intervalo original vazio (inserção pura)?
    pub fn orig_is_empty(&self) -> bool {
        self.orig_start == self.orig_end
    }

    /// Intervalo corrigido vazio (deleção pura)?
    pub fn cor_is_empty(&self) -> bool {
        self.cor_start == self.cor_end
    }
}

/// Classes grossas de palavras funcionais (fechadas).
const FUNCTION_POS: &[&str] = &["DET", "PREP", "PRON", "PART", "CONJ"];

fn is_function_word(tok: &AnnotatedToken) -> bool {
    FUNCTION_POS.contains(&tok.pos_coarse.as_str()) || tok.pos_fine == "MD"
}

/// Funde as operações de um par de sentenças em edições, já minimizadas e
/// ordenadas por `orig_start`. A categoria sai vazia.
pub fn merge(
    ops: &[ElementaryOp],
    orig: &AnnotatedSentence,
    cor: &AnnotatedSentence,
    policy: MergePolicy,
) -> Vec<Edit> {
    let mut edits = Vec::new();
    let mut run: Vec<&ElementaryOp> = Vec::new();

    for op in ops {
        if op.is_match() {
            flush_run(&run, orig, cor, policy, &mut edits);
            run.clear();
        } else {
            run.push(op);
        }
    }
    flush_run(&run, orig, cor, policy, &mut edits);
    edits
}

fn flush_run(
    run: &[&ElementaryOp],
    orig: &AnnotatedSentence,
    cor: &AnnotatedSentence,
    policy: MergePolicy,
    edits: &mut Vec<Edit>,
) {
    if run.is_empty() {
        return;
    }
    let groups = match policy {
        MergePolicy::AllSplit => run.iter().map(|op| vec![*op]).collect(),
        MergePolicy::AllMerge => vec![run.to_vec()],
        MergePolicy::AllEqual => group_equal(run),
        MergePolicy::Rules => apply_merge_rules(group_equal(run), orig, cor),
    };
    for group in groups {
        if let Some(edit) = edit_from_group(&group, orig, cor) {
            edits.push(edit);
        }
    }
}

/// Agrupa operações consecutivas do mesmo tipo.
fn group_equal<'a>(run: &[&'a ElementaryOp]) -> Vec<Vec<&'a ElementaryOp>> {
    let mut groups: Vec<Vec<&ElementaryOp>> = Vec::new();
    for op in run {
        match groups.last_mut() {
            Some(last) if last[0].kind == op.kind => last.push(op),
            _ => groups.push(vec![op]),
        }
    }
    groups
}

/// Exceções linguísticas sobre o agrupamento `all-equal`: junta um grupo de
/// substituições com um grupo vizinho de inserções/deleções quando o material
/// inserido/apagado é todo de palavras funcionais.
fn apply_merge_rules<'a>(
    mut groups: Vec<Vec<&'a ElementaryOp>>,
    orig: &AnnotatedSentence,
    cor: &AnnotatedSentence,
) -> Vec<Vec<&'a ElementaryOp>> {
    let mut i = 0;
    while i + 1 < groups.len() {
        if should_join(&groups[i], &groups[i + 1], orig, cor) {
            let next = groups.remove(i + 1);
            groups[i].extend(next);
            // Não avança: o grupo fundido pode absorver o próximo vizinho.
        } else {
            i += 1;
        }
    }
    groups
}

fn should_join(
    a: &[&ElementaryOp],
    b: &[&ElementaryOp],
    orig: &AnnotatedSentence,
    cor: &AnnotatedSentence,
) -> bool {
    (has_substitution(a) && is_function_indel(b, orig, cor))
        || (has_substitution(b) && is_function_indel(a, orig, cor))
}

fn has_substitution(group: &[&ElementaryOp]) -> bool {
    group.iter().any(|op| op.kind == OpKind::Substitution)
}

/// O grupo é só inserção/deleção e todo o material afetado é funcional?
fn is_function_indel(
    group: &[&ElementaryOp],
    orig: &AnnotatedSentence,
    cor: &AnnotatedSentence,
) -> bool {
    group.iter().all(|op| match op.kind {
        OpKind::Deletion => orig.span(op.orig_start, op.orig_end).iter().all(is_function_word),
        OpKind::Insertion => cor.span(op.cor_start, op.cor_end).iter().all(is_function_word),
        _ => false,
    })
}

/// Constrói a edição de um grupo: os intervalos vão do início da primeira
/// operação ao fim da última, e a minimização apara as pontas.
fn edit_from_group(
    group: &[&ElementaryOp],
    orig: &AnnotatedSentence,
    cor: &AnnotatedSentence,
) -> Option<Edit> {
    let first = group.first()?;
    let last = group.last()?;
    minimise_span(
        first.orig_start,
        last.orig_end,
        first.cor_start,
        last.cor_end,
        orig,
        cor,
    )
}

/// Apara prefixo e sufixo comuns de um intervalo de edição.
///
/// Idempotente: aplicar duas vezes dá o mesmo resultado. Devolve `None`
/// quando a edição minimiza para vazio dos dois lados.
fn minimise_span(
    mut os: usize,
    mut oe: usize,
    mut cs: usize,
    mut ce: usize,
    orig: &AnnotatedSentence,
    cor: &AnnotatedSentence,
) -> Option<Edit> {
    while os < oe && cs < ce && orig.tokens[os].text == cor.tokens[cs].text {
        os += 1;
        cs += 1;
    }
    while os < oe && cs < ce && orig.tokens[oe - 1].text == cor.tokens[ce - 1].text {
        oe -= 1;
        ce -= 1;
    }
    if os == oe && cs == ce {
        return None;
    }
    Some(Edit {
        orig_start: os,
        orig_end: oe,
        category: String::new(),
        orig_text: orig.span_text(os, oe),
        cor_text: cor.span_text(cs, ce),
        cor_start: cs,
        cor_end: ce,
    })
}

/// Reaplica a minimização a uma edição já construída (exposto para teste de
/// idempotência).
pub fn minimise(edit: &Edit, orig: &AnnotatedSentence, cor: &AnnotatedSentence) -> Option<Edit> {
    let mut trimmed = minimise_span(
        edit.orig_start,
        edit.orig_end,
        edit.cor_start,
        edit.cor_end,
        orig,
        cor,
    )?;
    trimmed.category = edit.category.clone();
    Some(trimmed)
}
