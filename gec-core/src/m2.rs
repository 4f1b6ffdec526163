//! # O Formato Textual M2
//!
//! Cada par de sentenças vira um registro de três tipos de linha:
//!
//! ```text
//! S She go to school .
//! T She goes to school .
//! A 1 2|||VERB:SVA|||go|||goes|||1|||2|||0
//! ```
//!
//! `S` é a sentença original tokenizada, `T` a corrigida, e cada `A` uma
//! edição: intervalo original, categoria, texto original, texto corrigido,
//! intervalo corrigido e o identificador do anotador. Registros são
//! separados por linha em branco.
//!
//! Quando as duas sentenças são idênticas, o registro carrega o sentinela
//! [`NOOP_EDIT_LINE`] no lugar das edições — os índices `-1 -1` nunca
//! aparecem em edição real.
//!
//! ## Tokens com traços
//!
//! Com um delimitador configurado, cada token das linhas `S`/`T` carrega as
//! próprias anotações coladas: `texto|lema|fina|grossa|dep|núcleo`. Sem
//! delimitador, sai só a forma de superfície.
//!
//! O módulo também **lê** registros de volta ([`parse_record`]) e reaplica
//! as edições sobre a sentença original ([`apply_edits`]), reconstruindo a
//! corrigida com contabilidade de deslocamento — a base do teste de ida e
//! volta.

use thiserror::Error;

use crate::merger::Edit;
use crate::token::AnnotatedSentence;

/// Sentinela de sentenças idênticas. Literal fixo, nunca montado.
pub const NOOP_EDIT_LINE: &str = "A -1 -1|||noop|||-NONE-|||REQUIRED|||-NONE-|||0";

/// Opções de renderização de um registro.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Delimitador dos traços por token nas linhas `S`/`T`; `None` = só texto.
    pub feature_delimiter: Option<String>,
    /// Identificador do anotador nas linhas `A`.
    pub coder_id: u32,
}

/// Renderiza uma linha `A` de edição classificada.
pub fn format_edit(edit: &Edit, coder_id: u32) -> String {
    format!(
        "A {} {}|||{}|||{}|||{}|||{}|||{}|||{}",
        edit.orig_start,
        edit.orig_end,
        edit.category,
        edit.orig_text,
        edit.cor_text,
        edit.cor_start,
        edit.cor_end,
        coder_id
    )
}

/// Renderiza uma linha `S` ou `T`.
fn format_sentence_line(prefix: char, sent: &AnnotatedSentence, opts: &FormatOptions) -> String {
    let body = match &opts.feature_delimiter {
        None => sent.texts().join(" "),
        Some(delim) => sent
            .tokens
            .iter()
            .map(|t| {
                let head = &sent.tokens[t.head_index].text;
                [
                    t.text.as_str(),
                    t.lemma.as_str(),
                    t.pos_fine.as_str(),
                    t.pos_coarse.as_str(),
                    t.dep_label.as_str(),
                    head.as_str(),
                ]
                .join(delim)
            })
            .collect::<Vec<_>>()
            .join(" "),
    };
    format!("{prefix} {body}")
}

/// Renderiza o registro completo de um par, sem a linha em branco final
/// (o chamador separa registros).
///
/// `noop = true` emite o sentinela no lugar das edições.
pub fn format_record(
    orig: &AnnotatedSentence,
    cor: &AnnotatedSentence,
    edits: &[Edit],
    noop: bool,
    opts: &FormatOptions,
) -> String {
    let mut lines = Vec::with_capacity(edits.len() + 2);
    lines.push(format_sentence_line('S', orig, opts));
    lines.push(format_sentence_line('T', cor, opts));
    if noop {
        lines.push(NOOP_EDIT_LINE.to_string());
    } else {
        for edit in edits {
            lines.push(format_edit(edit, opts.coder_id));
        }
    }
    lines.join("\n")
}

/// Falha de leitura de um registro M2.
#[derive(Debug, Error)]
pub enum M2ParseError {
    #[error("registro sem linha S")]
    MissingSource,

    #[error("linha A malformada: {line:?}")]
    BadEditLine { line: String },

    #[error("intervalo de edição inválido na linha: {line:?}")]
    BadSpan { line: String },
}

/// Uma edição lida de uma linha `A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEdit {
    pub orig_start: usize,
    pub orig_end: usize,
    pub category: String,
    pub orig_text: String,
    pub cor_text: String,
    pub cor_start: usize,
    pub cor_end: usize,
    pub coder_id: u32,
}

/// Um registro lido de volta: tokens das duas sentenças e as edições.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub orig_tokens: Vec<String>,
    pub cor_tokens: Vec<String>,
    pub edits: Vec<ParsedEdit>,
    pub noop: bool,
}

/// Lê um registro (bloco de linhas `S`/`T`/`A`, sem linha em branco).
///
/// Linhas `S`/`T` com traços por token não são desmontadas aqui: o chamador
/// que usa delimitador sabe desmontar; este leitor assume texto puro.
pub fn parse_record(block: &str) -> Result<ParsedRecord, M2ParseError> {
    let mut orig_tokens = None;
    let mut cor_tokens = Vec::new();
    let mut edits = Vec::new();
    let mut noop = false;

    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("S ") {
            orig_tokens = Some(rest.split_whitespace().map(str::to_string).collect());
        } else if let Some(rest) = line.strip_prefix("T ") {
            cor_tokens = rest.split_whitespace().map(str::to_string).collect();
        } else if line == "S" {
            // Sentença original vazia.
            orig_tokens = Some(Vec::new());
        } else if line == "T" {
            cor_tokens = Vec::new();
        } else if line.starts_with("A ") {
            // O sentinela é reconhecido pela categoria, não byte a byte:
            // o coder id da linha pode variar.
            if line.split("|||").nth(1) == Some("noop") {
                noop = true;
            } else {
                edits.push(parse_edit_line(line)?);
            }
        }
    }

    Ok(ParsedRecord {
        orig_tokens: orig_tokens.ok_or(M2ParseError::MissingSource)?,
        cor_tokens,
        edits,
        noop,
    })
}

fn parse_edit_line(line: &str) -> Result<ParsedEdit, M2ParseError> {
    let bad = || M2ParseError::BadEditLine { line: line.to_string() };
    let rest = line.strip_prefix("A ").ok_or_else(bad)?;
    let fields: Vec<&str> = rest.split("|||").collect();
    if fields.len() != 7 {
        return Err(bad());
    }
    let mut span = fields[0].split_whitespace();
    let parse_idx = |s: Option<&str>| -> Result<usize, M2ParseError> {
        s.and_then(|v| v.parse().ok())
            .ok_or(M2ParseError::BadSpan { line: line.to_string() })
    };
    let orig_start = parse_idx(span.next())?;
    let orig_end = parse_idx(span.next())?;
    let cor_start = parse_idx(Some(fields[4]))?;
    let cor_end = parse_idx(Some(fields[5]))?;
    if orig_end < orig_start || cor_end < cor_start {
        return Err(M2ParseError::BadSpan { line: line.to_string() });
    }
    let coder_id = fields[6]
        .trim()
        .parse()
        .map_err(|_| bad())?;
    Ok(ParsedEdit {
        orig_start,
        orig_end,
        category: fields[1].to_string(),
        orig_text: fields[2].to_string(),
        cor_text: fields[3].to_string(),
        cor_start,
        cor_end,
        coder_id,
    })
}

/// Reconstrói a sentença corrigida aplicando as edições sobre os tokens
/// originais, com contabilidade de deslocamento: cada edição aplicada
/// desloca os índices das seguintes.
///
/// As edições são ordenadas por intervalo antes da aplicação — linhas `A`
/// fora de ordem num arquivo escrito à mão não quebram a reconstrução.
/// Intervalos fora dos limites da sentença são recortados para dentro.
pub fn apply_edits(orig_tokens: &[String], edits: &[ParsedEdit]) -> Vec<String> {
    let mut ordered: Vec<&ParsedEdit> = edits.iter().collect();
    ordered.sort_by_key(|e| (e.orig_start, e.orig_end));

    let mut toks: Vec<String> = orig_tokens.to_vec();
    let mut offset: isize = 0;
    for edit in ordered {
        let len = toks.len() as isize;
        let start = (edit.orig_start as isize + offset).clamp(0, len);
        let end = (edit.orig_end as isize + offset).clamp(start, len);
        let (start, end) = (start as usize, end as usize);
        let replacement: Vec<String> =
            edit.cor_text.split_whitespace().map(str::to_string).collect();
        offset += replacement.len() as isize - (end - start) as isize;
        toks.splice(start..end, replacement);
    }
    toks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::AnnotatedToken;

    fn tok(text: &str, lemma: &str, fine: &str, coarse: &str, dep: &str, head: usize) -> AnnotatedToken {
        AnnotatedToken {
            text: text.to_string(),
            lemma: lemma.to_string(),
            pos_coarse: coarse.to_string(),
            pos_fine: fine.to_string(),
            dep_label: dep.to_string(),
            head_index: head,
        }
    }

    fn plain(text: &str) -> AnnotatedSentence {
        AnnotatedSentence::new(
            text.split_whitespace()
                .map(|t| tok(t, t, "NN", "NOUN", "dep", 0))
                .collect(),
        )
    }

    fn sva_edit() -> Edit {
        Edit {
            orig_start: 1,
            orig_end: 2,
            category: "VERB:SVA".to_string(),
            orig_text: "go".to_string(),
            cor_text: "goes".to_string(),
            cor_start: 1,
            cor_end: 2,
        }
    }

    #[test]
    fn test_format_edit_field_order() {
        assert_eq!(
            format_edit(&sva_edit(), 0),
            "A 1 2|||VERB:SVA|||go|||goes|||1|||2|||0"
        );
    }

    #[test]
    fn test_format_record_plain() {
        let orig = plain("She go to school .");
        let cor = plain("She goes to school .");
        let record = format_record(&orig, &cor, &[sva_edit()], false, &FormatOptions::default());
        assert_eq!(
            record,
            "S She go to school .\n\
             T She goes to school .\n\
             A 1 2|||VERB:SVA|||go|||goes|||1|||2|||0"
        );
    }

    #[test]
    fn test_format_record_noop_sentinel() {
        let sent = plain("Nothing wrong here .");
        let record = format_record(&sent, &sent, &[], true, &FormatOptions::default());
        assert!(record.ends_with(NOOP_EDIT_LINE));
        // O sentinela é um literal: nenhuma edição real carrega -1.
        assert!(record.contains("|||noop|||"));
    }

    #[test]
    fn test_format_with_feature_delimiter() {
        let orig = AnnotatedSentence::new(vec![
            tok("She", "she", "PRP", "PRON", "nsubj", 1),
            tok("goes", "go", "VBZ", "VERB", "root", 1),
        ]);
        let opts = FormatOptions {
            feature_delimiter: Some("|".to_string()),
            coder_id: 0,
        };
        let line = format_sentence_line('S', &orig, &opts);
        assert_eq!(line, "S She|she|PRP|PRON|nsubj|goes goes|go|VBZ|VERB|root|goes");
    }

    #[test]
    fn test_parse_rejects_bad_edit_line() {
        let block = "S a b\nT a c\nA 1 2|||cat|||b";
        match parse_record(block) {
            Err(M2ParseError::BadEditLine { .. }) => {}
            other => panic!("esperava BadEditLine, veio {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_single_edit() {
        let orig = plain("She go to school .");
        let cor = plain("She goes to school .");
        let written = format_record(&orig, &cor, &[sva_edit()], false, &FormatOptions::default());

        let parsed = parse_record(&written).unwrap();
        assert_eq!(parsed.orig_tokens, orig.texts());
        assert_eq!(parsed.cor_tokens, cor.texts());
        assert_eq!(parsed.edits.len(), 1);
        assert_eq!(parsed.edits[0].category, "VERB:SVA");

        let rebuilt = apply_edits(&parsed.orig_tokens, &parsed.edits);
        assert_eq!(rebuilt, parsed.cor_tokens);
    }

    #[test]
    fn test_parse_noop_with_other_coder_id() {
        // O coder id do sentinela pode variar; a categoria é o que conta.
        let block = "S a b\nT a b\nA -1 -1|||noop|||-NONE-|||REQUIRED|||-NONE-|||5";
        let parsed = parse_record(block).unwrap();
        assert!(parsed.noop);
        assert!(parsed.edits.is_empty());
    }

    #[test]
    fn test_apply_edits_sorts_out_of_order_lines() {
        // Linhas A fora de ordem: a aplicação reordena por intervalo antes
        // de mexer nos deslocamentos.
        let block = "S a b c d\nT A b c D\n\
                     A 3 4|||OTHER|||d|||D|||3|||4|||0\n\
                     A 0 1|||OTHER|||a|||A|||0|||1|||0";
        let parsed = parse_record(block).unwrap();
        let rebuilt = apply_edits(&parsed.orig_tokens, &parsed.edits);
        assert_eq!(rebuilt, parsed.cor_tokens);
    }

    #[test]
    fn test_apply_edits_clamps_out_of_bounds_span() {
        let toks: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let edits = vec![ParsedEdit {
            orig_start: 5,
            orig_end: 9,
            category: "OTHER".to_string(),
            orig_text: String::new(),
            cor_text: "x".to_string(),
            cor_start: 5,
            cor_end: 6,
            coder_id: 0,
        }];
        // Intervalo além do fim é recortado: insere no fim, sem pânico.
        let rebuilt = apply_edits(&toks, &edits);
        assert_eq!(rebuilt, vec!["a", "b", "x"]);
    }

    #[test]
    fn test_round_trip_with_offset_bookkeeping() {
        // Duas edições que mudam o comprimento: a segunda precisa do
        // deslocamento acumulado da primeira para cair no lugar certo.
        let orig = plain("He go at home yesterday");
        let cor = plain("He goes home yesterday");
        let edits = vec![
            Edit {
                orig_start: 1,
                orig_end: 2,
                category: "VERB:SVA".to_string(),
                orig_text: "go".to_string(),
                cor_text: "goes".to_string(),
                cor_start: 1,
                cor_end: 2,
            },
            Edit {
                orig_start: 2,
                orig_end: 3,
                category: "PREP".to_string(),
                orig_text: "at".to_string(),
                cor_text: String::new(),
                cor_start: 2,
                cor_end: 2,
            },
        ];
        let written = format_record(&orig, &cor, &edits, false, &FormatOptions::default());
        let parsed = parse_record(&written).unwrap();
        let rebuilt = apply_edits(&parsed.orig_tokens, &parsed.edits);
        assert_eq!(rebuilt, parsed.cor_tokens);
    }
}
