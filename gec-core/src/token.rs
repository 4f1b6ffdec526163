//! # Tokens Anotados e o Provedor de Anotação
//!
//! Define a unidade básica de todo o pipeline: o [`AnnotatedToken`], um token
//! já enriquecido com lema, classe gramatical (fina e grossa), relação de
//! dependência e a referência ao seu núcleo sintático (head).
//!
//! ## Referências por índice
//!
//! A referência ao head é feita por **índice** dentro da própria sentença
//! ([`AnnotatedSentence`]), nunca por ponteiro ou referência compartilhada.
//! Isso mantém os tokens imutáveis e livres de ciclos de posse: a sentença é a
//! arena, o índice é o "ponteiro".
//!
//! ## O Provedor de Anotação
//!
//! O alinhador e o classificador não sabem (nem querem saber) qual etiquetador
//! produziu a anotação. Qualquer backend que implemente [`AnnotationProvider`]
//! serve: o provedor heurístico embutido (`annotator`), um serviço externo ou
//! um mock de teste com anotações fixadas à mão.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Um token com suas anotações linguísticas.
///
/// Imutável depois de produzido pelo provedor. A identidade do token é
/// posicional: o índice dele dentro da [`AnnotatedSentence`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    /// Forma de superfície (ex: "goes").
    pub text: String,
    /// Lema (ex: "go").
    pub lemma: String,
    /// Classe gramatical grossa, já mapeada pelo tag map (ex: "VERB", "PREP").
    pub pos_coarse: String,
    /// Classe gramatical fina, estilo PTB (ex: "VBZ", "IN").
    pub pos_fine: String,
    /// Rótulo da relação de dependência (ex: "nsubj", "prep", "punct").
    pub dep_label: String,
    /// Índice do núcleo sintático dentro da mesma sentença.
    /// A raiz aponta para si mesma.
    pub head_index: usize,
}

/// Uma sentença anotada: sequência ordenada de tokens.
///
/// Comprimento zero é legal (ex: linha vazia depois do trim).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedSentence {
    pub tokens: Vec<AnnotatedToken>,
}

impl AnnotatedSentence {
    pub fn new(tokens: Vec<AnnotatedToken>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Formas de superfície de todos os tokens, na ordem.
    pub fn texts(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// Texto de um intervalo `[start, end)` de tokens, separado por espaço.
    pub fn span_text(&self, start: usize, end: usize) -> String {
        self.tokens[start..end]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fatia de tokens de um intervalo `[start, end)`.
    pub fn span(&self, start: usize, end: usize) -> &[AnnotatedToken] {
        &self.tokens[start..end]
    }
}

/// Falha do provedor de anotação para uma sentença específica.
///
/// Não é fatal para a execução: o par ofensor é pulado e contabilizado
/// (ver `pipeline`), e o processamento continua.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// O texto não pôde ser processado (codificação inválida, lixo binário...).
    #[error("texto malformado: {reason}")]
    Malformed { reason: String },

    /// O backend externo falhou por um motivo próprio.
    #[error("falha do backend de anotação: {reason}")]
    Backend { reason: String },
}

/// Contrato do provedor de anotação.
///
/// Uma função pura na prática: mesma entrada, mesma sentença anotada.
/// `Send + Sync` porque o pool de workers compartilha o provedor em
/// modo somente-leitura (ver `pipeline`).
pub trait AnnotationProvider: Send + Sync {
    /// Tokeniza e anota uma sentença crua.
    fn annotate(&self, raw: &str) -> Result<AnnotatedSentence, AnnotationError>;
}

/// Pontuações que se colam ao token anterior na detokenização.
const ATTACH_LEFT: &[&str] = &[".", ",", "!", "?", ";", ":", ")", "]", "}", "%", "...", "''"];

/// Tokens que se colam ao token seguinte.
const ATTACH_RIGHT: &[&str] = &["(", "[", "{", "``", "$", "£", "€"];

/// Clíticos e contrações que se colam ao token anterior sem espaço.
const CLITICS: &[&str] = &["n't", "'s", "'re", "'ve", "'ll", "'d", "'m"];

/// Reconstrói texto corrido a partir de tokens pré-separados.
///
/// Usado pelas flags de detokenização por lado: quando a entrada já vem
/// tokenizada por espaço, reanexamos pontuação e contrações antes de passar
/// o texto ao provedor, que fará a própria tokenização.
///
/// # Exemplo
/// `["I", "do", "n't", "know", "."]` → `"I don't know."`
pub fn detokenize(tokens: &[&str]) -> String {
    let mut out = String::new();
    let mut glue_next = false;
    for (i, tok) in tokens.iter().enumerate() {
        let attach_left = ATTACH_LEFT.contains(tok)
            || CLITICS.contains(tok)
            || (tok.starts_with('\'') && tok.len() <= 3);
        if i > 0 && !attach_left && !glue_next {
            out.push(' ');
        }
        out.push_str(tok);
        glue_next = ATTACH_RIGHT.contains(tok);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str) -> AnnotatedToken {
        AnnotatedToken {
            text: text.to_string(),
            lemma: text.to_lowercase(),
            pos_coarse: "NOUN".to_string(),
            pos_fine: "NN".to_string(),
            dep_label: "dep".to_string(),
            head_index: 0,
        }
    }

    #[test]
    fn test_span_text() {
        let sent = AnnotatedSentence::new(vec![tok("She"), tok("goes"), tok("home")]);
        assert_eq!(sent.span_text(1, 3), "goes home");
        assert_eq!(sent.span_text(1, 1), "");
    }

    #[test]
    fn test_detokenize_punctuation() {
        let toks = vec!["I", "do", "n't", "know", "."];
        assert_eq!(detokenize(&toks), "I don't know.");
    }

    #[test]
    fn test_detokenize_brackets() {
        let toks = vec!["He", "left", "(", "quickly", ")", "."];
        assert_eq!(detokenize(&toks), "He left (quickly).");
    }

    #[test]
    fn test_empty_sentence_is_legal() {
        let sent = AnnotatedSentence::default();
        assert!(sent.is_empty());
        assert!(sent.texts().is_empty());
    }
}
