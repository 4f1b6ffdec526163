//! # Classificador de Tipo de Erro
//!
//! Atribui a cada edição uma categoria de erro linguisticamente motivada.
//! A política de decisão é **a primeira regra que casa, vence**: as regras
//! vivem numa tabela ordenada e explícita ([`RULES`]), avaliada de cima para
//! baixo. A prioridade fica visível e cada regra é testável isoladamente,
//! em vez de enterrada numa cadeia de `if`s.
//!
//! ## A tabela de regras
//!
//! 1. Inserção ou deleção pura de tokens com a mesma classe grossa → a
//!    própria classe (`DET`, `PREP`, `PUNCT`...).
//! 2. Substituição token-a-token, mesma classe, mesmo stem → categoria
//!    flexional qualificada (`NOUN:NUM`, `VERB:TENSE`, `VERB:SVA`...).
//! 3. Diferença apenas de caixa/pontuação interna → `ORTH`.
//! 4. Original fora da lista de palavras, correção dentro, formas
//!    parecidas caractere a caractere → `SPELL`.
//! 5. Mesmo multiconjunto de formas em outra ordem → `WO`.
//! 6. Classes grossas divergentes → classe dominante do lado corrigido,
//!    com desambiguação de sintagma preposicional pela dependência.
//! 7. Nada casou → `OTHER`.
//!
//! A categoria `noop` é reservada ao sentinela de sentenças idênticas e
//! nunca sai daqui. A classificação é uma função pura da edição, do par de
//! sentenças e dos recursos compartilhados: entrada igual, rótulo igual.

use std::collections::HashMap;

use crate::aligner::char_similarity;
use crate::merger::Edit;
use crate::resources::{stem, LexicalResources};
use crate::token::{AnnotatedSentence, AnnotatedToken};

/// Limiar de semelhança de caracteres para aceitar `SPELL`.
const SPELL_SIMILARITY: f64 = 0.5;

/// Visão de uma edição já recortada nas sentenças: as fatias de tokens dos
/// dois lados e os recursos compartilhados. As regras enxergam só isto.
struct EditView<'a> {
    orig: &'a [AnnotatedToken],
    cor: &'a [AnnotatedToken],
    resources: &'a LexicalResources,
}

/// A tabela ordenada de regras: cada uma devolve `Some(rótulo)` quando
/// casa. A ordem É a prioridade.
const RULES: &[fn(&EditView<'_>) -> Option<String>] = &[
    rule_uniform_indel,
    rule_inflection,
    rule_orthography,
    rule_spelling,
    rule_word_order,
    rule_pos_swap,
];

/// Classifica uma edição. Não mexe nos intervalos; só produz o rótulo.
pub fn classify(
    edit: &Edit,
    orig: &AnnotatedSentence,
    cor: &AnnotatedSentence,
    resources: &LexicalResources,
) -> String {
    let view = EditView {
        orig: orig.span(edit.orig_start, edit.orig_end),
        cor: cor.span(edit.cor_start, edit.cor_end),
        resources,
    };
    for rule in RULES {
        if let Some(label) = rule(&view) {
            return label;
        }
    }
    "OTHER".to_string()
}

/// Regra 1: inserção/deleção pura cujos tokens têm todos a mesma classe
/// grossa. O rótulo é a própria classe.
fn rule_uniform_indel(view: &EditView<'_>) -> Option<String> {
    let side = match (view.orig.is_empty(), view.cor.is_empty()) {
        (true, false) => view.cor,
        (false, true) => view.orig,
        _ => return None,
    };
    let first = side.first()?.pos_coarse.as_str();
    if side.iter().all(|t| t.pos_coarse == first) {
        Some(first.to_string())
    } else {
        None
    }
}

/// Regra 2: substituição de um token por outro da mesma classe e mesmo stem
/// — uma flexão. O subtipo vem da morfologia de superfície, não da
/// semântica.
fn rule_inflection(view: &EditView<'_>) -> Option<String> {
    let (o, c) = single_pair(view)?;
    // Variação só de caixa não é flexão; deixa para a regra de ortografia.
    if o.text.to_lowercase() == c.text.to_lowercase() {
        return None;
    }
    if o.pos_coarse != c.pos_coarse || stem(&o.text) != stem(&c.text) {
        return None;
    }
    match o.pos_coarse.as_str() {
        "NOUN" => Some("NOUN:NUM".to_string()),
        "ADJ" => Some("ADJ:FORM".to_string()),
        "VERB" => Some(verb_subtype(o, c)),
        _ => None,
    }
}

/// Subtipo verbal, decidido por sufixo e tag fina.
///
/// Ordem importa: particípio/passado antes da concordância, porque "was" e
/// "is" terminam ambos em letra que confundiria a checagem de `-s`.
fn verb_subtype(o: &AnnotatedToken, c: &AnnotatedToken) -> String {
    let ends = |t: &AnnotatedToken, suf: &str| t.text.to_lowercase().ends_with(suf);
    let fine = |t: &AnnotatedToken, tag: &str| t.pos_fine == tag;

    if ends(o, "ing") || ends(c, "ing") {
        "VERB:FORM".to_string()
    } else if fine(o, "VBD") || fine(c, "VBD") || fine(o, "VBN") || fine(c, "VBN")
        || ends(o, "ed") || ends(c, "ed") || ends(o, "en") || ends(c, "en")
    {
        "VERB:TENSE".to_string()
    } else if fine(o, "VBZ") || fine(c, "VBZ") || ends(o, "s") != ends(c, "s") {
        "VERB:SVA".to_string()
    } else {
        "VERB:INFL".to_string()
    }
}

/// Regra 3: os dois lados são o mesmo material a menos de caixa ou de
/// pontuação interna (hífen, apóstrofo).
fn rule_orthography(view: &EditView<'_>) -> Option<String> {
    let (o, c) = single_pair(view)?;
    let strip = |s: &str| {
        s.chars()
            .filter(|ch| ch.is_alphanumeric())
            .flat_map(|ch| ch.to_lowercase())
            .collect::<String>()
    };
    let equal_folded = o.text.to_lowercase() == c.text.to_lowercase();
    if equal_folded || (!strip(&o.text).is_empty() && strip(&o.text) == strip(&c.text)) {
        Some("ORTH".to_string())
    } else {
        None
    }
}

/// Regra 4: o original não consta na lista de palavras (nem em minúsculas),
/// a correção consta, e as duas formas são parecidas o bastante para ser um
/// deslize de grafia e não uma troca de palavra.
fn rule_spelling(view: &EditView<'_>) -> Option<String> {
    let (o, c) = single_pair(view)?;
    let res = view.resources;
    if !res.known_word_normalized(&o.text)
        && res.known_word_normalized(&c.text)
        && char_similarity(&o.text, &c.text) > SPELL_SIMILARITY
    {
        Some("SPELL".to_string())
    } else {
        None
    }
}

/// Regra 5: mesmos tokens, outra ordem.
fn rule_word_order(view: &EditView<'_>) -> Option<String> {
    if view.orig.len() < 2 || view.orig.len() != view.cor.len() {
        return None;
    }
    let mut a: Vec<&str> = view.orig.iter().map(|t| t.text.as_str()).collect();
    let mut b: Vec<&str> = view.cor.iter().map(|t| t.text.as_str()).collect();
    a.sort_unstable();
    b.sort_unstable();
    if a == b {
        Some("WO".to_string())
    } else {
        None
    }
}

/// Regra 6: as classes grossas dos dois lados divergem. O rótulo é a classe
/// dominante do lado corrigido; um sintagma preposicional corrigido (tokens
/// pendurados numa cadeia `prep`/`pobj`) recebe `PREP` mesmo quando outra
/// classe é maioria.
fn rule_pos_swap(view: &EditView<'_>) -> Option<String> {
    // Só substituições: inserção/deleção pura é assunto da regra 1, e uma
    // indel de classes mistas cai direto no OTHER final.
    if view.orig.is_empty() || view.cor.is_empty() {
        return None;
    }
    if pos_multiset(view.orig) == pos_multiset(view.cor) {
        return None;
    }
    let side = view.cor;
    let has_prep = side.iter().any(|t| t.pos_coarse == "PREP");
    let prep_chain = side
        .iter()
        .any(|t| t.dep_label == "prep" || t.dep_label == "pobj");
    if has_prep && prep_chain {
        return Some("PREP".to_string());
    }
    dominant_pos(side)
}

fn pos_multiset(tokens: &[AnnotatedToken]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for t in tokens {
        *counts.entry(t.pos_coarse.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Classe grossa mais frequente da fatia; empate decidido pela última
/// ocorrência na ordem da sentença.
fn dominant_pos(tokens: &[AnnotatedToken]) -> Option<String> {
    let counts = pos_multiset(tokens);
    let mut best: Option<(&str, usize)> = None;
    for t in tokens {
        let pos = t.pos_coarse.as_str();
        let n = counts[pos];
        match best {
            Some((_, m)) if n < m => {}
            _ => best = Some((pos, n)),
        }
    }
    best.map(|(pos, _)| pos.to_string())
}

/// Um token de cada lado, ou nada.
fn single_pair<'a>(view: &'a EditView<'_>) -> Option<(&'a AnnotatedToken, &'a AnnotatedToken)> {
    match (view.orig, view.cor) {
        ([o], [c]) => Some((o, c)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, lemma: &str, coarse: &str, fine: &str, dep: &str) -> AnnotatedToken {
        AnnotatedToken {
            text: text.to_string(),
            lemma: lemma.to_string(),
            pos_coarse: coarse.to_string(),
            pos_fine: fine.to_string(),
            dep_label: dep.to_string(),
            head_index: 0,
        }
    }

    fn sent(tokens: Vec<AnnotatedToken>) -> AnnotatedSentence {
        AnnotatedSentence::new(tokens)
    }

    /// Edição cobrindo os intervalos dados, com os textos já extraídos.
    fn edit(
        orig: &AnnotatedSentence,
        cor: &AnnotatedSentence,
        os: usize,
        oe: usize,
        cs: usize,
        ce: usize,
    ) -> Edit {
        Edit {
            orig_start: os,
            orig_end: oe,
            category: String::new(),
            orig_text: orig.span_text(os, oe),
            cor_text: cor.span_text(cs, ce),
            cor_start: cs,
            cor_end: ce,
        }
    }

    #[test]
    fn test_rule_1_pure_insertion_of_determiner() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("cat", "cat", "NOUN", "NN", "nsubj")]);
        let cor = sent(vec![
            tok("the", "the", "DET", "DT", "det"),
            tok("cat", "cat", "NOUN", "NN", "nsubj"),
        ]);
        let e = edit(&orig, &cor, 0, 0, 0, 1);
        assert_eq!(classify(&e, &orig, &cor, &res), "DET");
    }

    #[test]
    fn test_rule_1_pure_deletion_of_punctuation() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![
            tok(",", ",", "PUNCT", ",", "punct"),
            tok(",", ",", "PUNCT", ",", "punct"),
        ]);
        let cor = sent(vec![]);
        let e = edit(&orig, &cor, 0, 2, 0, 0);
        assert_eq!(classify(&e, &orig, &cor, &res), "PUNCT");
    }

    #[test]
    fn test_mixed_pos_insertion_falls_through_to_other() {
        // Inserção mista DET+NOUN não é um indel uniforme, e nenhuma regra
        // de substituição casa com lado vazio: resta o OTHER final.
        let res = LexicalResources::builtin();
        let orig = sent(vec![]);
        let cor = sent(vec![
            tok("the", "the", "DET", "DT", "det"),
            tok("cat", "cat", "NOUN", "NN", "dobj"),
        ]);
        let e = edit(&orig, &cor, 0, 0, 0, 2);
        assert_eq!(classify(&e, &orig, &cor, &res), "OTHER");
    }

    #[test]
    fn test_rule_2_subject_verb_agreement() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("go", "go", "VERB", "VBP", "root")]);
        let cor = sent(vec![tok("goes", "go", "VERB", "VBZ", "root")]);
        let e = edit(&orig, &cor, 0, 1, 0, 1);
        assert_eq!(classify(&e, &orig, &cor, &res), "VERB:SVA");
    }

    #[test]
    fn test_rule_2_noun_number() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("cat", "cat", "NOUN", "NN", "dobj")]);
        let cor = sent(vec![tok("cats", "cat", "NOUN", "NNS", "dobj")]);
        let e = edit(&orig, &cor, 0, 1, 0, 1);
        assert_eq!(classify(&e, &orig, &cor, &res), "NOUN:NUM");
    }

    #[test]
    fn test_rule_2_verb_tense_irregular() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("eat", "eat", "VERB", "VBP", "root")]);
        let cor = sent(vec![tok("ate", "eat", "VERB", "VBD", "root")]);
        let e = edit(&orig, &cor, 0, 1, 0, 1);
        assert_eq!(classify(&e, &orig, &cor, &res), "VERB:TENSE");
    }

    #[test]
    fn test_rule_2_verb_form_gerund() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("walk", "walk", "VERB", "VB", "xcomp")]);
        let cor = sent(vec![tok("walking", "walk", "VERB", "VBG", "xcomp")]);
        let e = edit(&orig, &cor, 0, 1, 0, 1);
        assert_eq!(classify(&e, &orig, &cor, &res), "VERB:FORM");
    }

    #[test]
    fn test_rule_3_case_difference_is_orth() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("smith", "smith", "NOUN", "NN", "nsubj")]);
        let cor = sent(vec![tok("Smith", "smith", "NOUN", "NNP", "nsubj")]);
        let e = edit(&orig, &cor, 0, 1, 0, 1);
        assert_eq!(classify(&e, &orig, &cor, &res), "ORTH");
    }

    #[test]
    fn test_rule_3_hyphenation_is_orth() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("air-port", "airport", "NOUN", "NN", "pobj")]);
        let cor = sent(vec![tok("airport", "airport", "NOUN", "NN", "pobj")]);
        let e = edit(&orig, &cor, 0, 1, 0, 1);
        assert_eq!(classify(&e, &orig, &cor, &res), "ORTH");
    }

    #[test]
    fn test_rule_4_unknown_to_known_is_spell() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("scool", "scool", "NOUN", "NN", "pobj")]);
        let cor = sent(vec![tok("school", "school", "NOUN", "NN", "pobj")]);
        let e = edit(&orig, &cor, 0, 1, 0, 1);
        assert_eq!(classify(&e, &orig, &cor, &res), "SPELL");
    }

    #[test]
    fn test_rule_4_requires_unknown_original() {
        // "cat" consta na lista: não é erro de grafia, e como as classes
        // coincidem a edição cai no OTHER final.
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("cat", "cat", "NOUN", "NN", "dobj")]);
        let cor = sent(vec![tok("dog", "dog", "NOUN", "NN", "dobj")]);
        let e = edit(&orig, &cor, 0, 1, 0, 1);
        assert_eq!(classify(&e, &orig, &cor, &res), "OTHER");
    }

    #[test]
    fn test_rule_5_word_order() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![
            tok("home", "home", "NOUN", "NN", "dobj"),
            tok("went", "go", "VERB", "VBD", "root"),
        ]);
        let cor = sent(vec![
            tok("went", "go", "VERB", "VBD", "root"),
            tok("home", "home", "NOUN", "NN", "dobj"),
        ]);
        let e = edit(&orig, &cor, 0, 2, 0, 2);
        assert_eq!(classify(&e, &orig, &cor, &res), "WO");
    }

    #[test]
    fn test_rule_6_pos_swap_takes_corrected_class() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("quickly", "quickly", "ADV", "RB", "advmod")]);
        let cor = sent(vec![tok("quick", "quick", "ADJ", "JJ", "amod")]);
        let e = edit(&orig, &cor, 0, 1, 0, 1);
        assert_eq!(classify(&e, &orig, &cor, &res), "ADJ");
    }

    #[test]
    fn test_rule_6_prepositional_phrase_disambiguation() {
        // "morning" → "in the morning": NOUN é maioria do lado corrigido,
        // mas a cadeia prep/pobj marca a correção como preposicional.
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("morning", "morning", "NOUN", "NN", "dobj")]);
        let cor = sent(vec![
            tok("in", "in", "PREP", "IN", "prep"),
            tok("the", "the", "DET", "DT", "det"),
            tok("morning", "morning", "NOUN", "NN", "pobj"),
        ]);
        let e = edit(&orig, &cor, 0, 1, 0, 3);
        assert_eq!(classify(&e, &orig, &cor, &res), "PREP");
    }

    #[test]
    fn test_classifier_is_deterministic() {
        let res = LexicalResources::builtin();
        let orig = sent(vec![tok("go", "go", "VERB", "VBP", "root")]);
        let cor = sent(vec![tok("goes", "go", "VERB", "VBZ", "root")]);
        let e = edit(&orig, &cor, 0, 1, 0, 1);
        let first = classify(&e, &orig, &cor, &res);
        for _ in 0..5 {
            assert_eq!(classify(&e, &orig, &cor, &res), first);
        }
    }
}
