//! # Recursos Lexicais — Lista de Palavras, Tag Map e Stemmer
//!
//! Recursos somente-leitura carregados uma única vez na inicialização e
//! compartilhados por todos os workers:
//!
//! - **Lista de palavras**: vocabulário inglês (semântica de conjunto — só
//!   importa a pertinência, não a frequência). Alimenta a regra `SPELL` do
//!   classificador.
//! - **Tag map**: mapeamento de classes finas (estilo PTB) para classes
//!   grossas, com ajustes fixos aplicados após a carga.
//! - **Stemmer**: redutor de sufixos no espírito do Lancaster — agressivo,
//!   iterativo, sem pretensão de produzir lemas "bonitos". Duas formas
//!   flexionadas da mesma palavra devem colidir no mesmo stem.
//!
//! ## Ajustes fixos do tag map
//!
//! Depois de carregar o arquivo, renomeamos `ADP` → `PREP` (mais legível nas
//! categorias de erro) e dobramos `PROPN` em `NOUN` (não precisamos de uma
//! classe separada para nomes próprios). Algumas tags sintéticas usadas por
//! etiquetadores reais são acrescentadas por cima: `""`, `SP`, `ADD`, `GW`,
//! `NFP` e `XX`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use thiserror::Error;

/// Tag map padrão embutido (PTB → classes grossas).
const DEFAULT_TAG_MAP: &str = include_str!("../resources/en-ptb-map.tsv");

/// Lista de palavras padrão embutida (inglês GB, formas -ise e -ize).
const DEFAULT_WORD_LIST: &str = include_str!("../resources/en-words.txt");

/// Falha na carga de um recurso. Fatal na inicialização: nenhuma sentença é
/// processada sem os recursos no lugar.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("não foi possível ler o recurso {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("linha {line} do tag map malformada (esperado `fina<TAB>grossa`): {content:?}")]
    MalformedTagMap { line: usize, content: String },
}

/// Os recursos lexicais compartilhados, imutáveis após a construção.
#[derive(Debug, Clone)]
pub struct LexicalResources {
    word_list: HashSet<String>,
    tag_map: HashMap<String, String>,
}

impl LexicalResources {
    /// Constrói os recursos a partir dos dados embutidos no binário.
    pub fn builtin() -> Self {
        Self {
            word_list: parse_word_list(DEFAULT_WORD_LIST),
            // O tag map embutido é bem formado por construção.
            tag_map: parse_tag_map(DEFAULT_TAG_MAP).unwrap_or_default(),
        }
    }

    /// Carrega os recursos de arquivos externos.
    ///
    /// `word_list`: tokens separados por espaço/quebra de linha.
    /// `tag_map`: pares `fina<TAB>grossa`, um por linha.
    pub fn from_files(word_list: &Path, tag_map: &Path) -> Result<Self, ResourceError> {
        let words = std::fs::read_to_string(word_list).map_err(|source| ResourceError::Io {
            path: word_list.display().to_string(),
            source,
        })?;
        let tags = std::fs::read_to_string(tag_map).map_err(|source| ResourceError::Io {
            path: tag_map.display().to_string(),
            source,
        })?;
        Ok(Self {
            word_list: parse_word_list(&words),
            tag_map: parse_tag_map(&tags)?,
        })
    }

    /// A palavra consta na lista exatamente como escrita?
    pub fn known_word(&self, word: &str) -> bool {
        self.word_list.contains(word)
    }

    /// A palavra consta na lista em alguma forma normalizada (minúsculas)?
    pub fn known_word_normalized(&self, word: &str) -> bool {
        self.word_list.contains(word) || self.word_list.contains(word.to_lowercase().as_str())
    }

    /// Mapeia uma classe fina para a grossa. Tags desconhecidas caem em `X`.
    pub fn coarse_tag(&self, fine: &str) -> &str {
        self.tag_map.get(fine).map(|s| s.as_str()).unwrap_or("X")
    }

    /// Quantidade de entradas no tag map (diagnóstico).
    pub fn tag_map_len(&self) -> usize {
        self.tag_map.len()
    }

    /// Quantidade de palavras conhecidas (diagnóstico).
    pub fn word_list_len(&self) -> usize {
        self.word_list.len()
    }
}

fn parse_word_list(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_string()).collect()
}

fn parse_tag_map(text: &str) -> Result<HashMap<String, String>, ResourceError> {
    let mut map = HashMap::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, '\t');
        let fine = parts.next().unwrap_or("").trim();
        let coarse = parts.next().map(str::trim).filter(|c| !c.is_empty());
        let coarse = match coarse {
            Some(c) => c,
            None => {
                return Err(ResourceError::MalformedTagMap {
                    line: i + 1,
                    content: line.to_string(),
                })
            }
        };
        // Ajustes fixos: ADP vira PREP (mais claro) e PROPN dobra em NOUN.
        let coarse = match coarse {
            "ADP" => "PREP",
            "PROPN" => "NOUN",
            other => other,
        };
        map.insert(fine.to_string(), coarse.to_string());
    }
    // Tags sintéticas de etiquetadores reais, fora do mapeamento original.
    map.insert("\"\"".to_string(), "PUNCT".to_string());
    map.insert("SP".to_string(), "SPACE".to_string());
    map.insert("ADD".to_string(), "X".to_string());
    map.insert("GW".to_string(), "X".to_string());
    map.insert("NFP".to_string(), "X".to_string());
    map.insert("XX".to_string(), "X".to_string());
    Ok(map)
}

/// Pares irregulares (flexão → stem) que nenhuma regra de sufixo alcança.
///
/// O alvo é o stem da forma base, não a base em si: as regras de sufixo
/// aparam o "e" mudo final, então `took` precisa mirar em `tak` para
/// colidir com `stem("take")`.
const IRREGULAR_STEMS: &[(&str, &str)] = &[
    ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"),
    ("been", "be"), ("being", "be"),
    ("has", "hav"), ("had", "hav"),
    ("does", "do"), ("did", "do"), ("done", "do"),
    ("went", "go"), ("gone", "go"),
    ("ate", "eat"),
    ("saw", "se"), ("seen", "se"),
    ("took", "tak"), ("taken", "tak"),
    ("gave", "giv"), ("given", "giv"),
    ("came", "com"),
    ("got", "get"),
    ("made", "mak"),
    ("knew", "know"), ("known", "know"),
    ("thought", "think"),
    ("said", "say"),
    ("told", "tell"),
    ("wrote", "writ"), ("written", "writ"),
    ("spoke", "speak"), ("spoken", "speak"),
    ("found", "find"),
    ("ran", "run"),
    ("men", "man"), ("women", "woman"), ("children", "child"),
    ("feet", "foot"), ("teeth", "tooth"), ("mice", "mous"), ("people", "person"),
];

/// Reduz uma palavra ao seu stem.
///
/// Estratégia Lancaster-lite: primeiro consulta a tabela de irregulares,
/// depois remove sufixos flexionais em cascata, do mais longo para o mais
/// curto, enquanto sobrar uma raiz de tamanho razoável.
///
/// O resultado não é um lema: `"studies"` vira `"study"`, mas `"running"`
/// vira `"runn"`. O que importa é que `stem("go") == stem("goes")`.
pub fn stem(word: &str) -> String {
    let lower = word.to_lowercase();
    for (infl, base) in IRREGULAR_STEMS {
        if lower == *infl {
            return (*base).to_string();
        }
    }

    // Cada regra encurta a palavra, então o laço sempre termina.
    let mut s = lower;
    loop {
        if s.len() > 4 && s.ends_with("ies") {
            s.truncate(s.len() - 3);
            s.push('y');
        } else if s.len() > 5 && s.ends_with("ing") {
            s.truncate(s.len() - 3);
        } else if s.len() > 4 && s.ends_with("est") {
            s.truncate(s.len() - 3);
        } else if s.len() > 4 && (s.ends_with("ed") || s.ends_with("er") || s.ends_with("en")) {
            s.truncate(s.len() - 2);
        } else if s.len() > 3 && s.ends_with('s') && !s.ends_with("ss") {
            s.truncate(s.len() - 1);
        } else if s.len() > 2 && s.ends_with('e') {
            // Vogal muda final: "like", "likes" e "liked" colidem em "lik".
            s.truncate(s.len() - 1);
        } else {
            break;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_resources_load() {
        let res = LexicalResources::builtin();
        assert!(res.word_list_len() > 100);
        assert!(res.tag_map_len() > 40);
    }

    #[test]
    fn test_tag_map_overrides() {
        let res = LexicalResources::builtin();
        // ADP renomeado para PREP, PROPN dobrado em NOUN
        assert_eq!(res.coarse_tag("IN"), "PREP");
        assert_eq!(res.coarse_tag("NNP"), "NOUN");
        // Tags sintéticas acrescentadas após a carga
        assert_eq!(res.coarse_tag("SP"), "SPACE");
        assert_eq!(res.coarse_tag("NFP"), "X");
        // Desconhecidas caem em X
        assert_eq!(res.coarse_tag("???"), "X");
    }

    #[test]
    fn test_word_list_membership() {
        let res = LexicalResources::builtin();
        assert!(res.known_word("school"));
        assert!(!res.known_word("scool"));
        assert!(res.known_word_normalized("School"));
    }

    #[test]
    fn test_malformed_tag_map_is_rejected() {
        let err = parse_tag_map("NN\tNOUN\nsem-tab\n").unwrap_err();
        match err {
            ResourceError::MalformedTagMap { line, .. } => assert_eq!(line, 2),
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn test_stem_collides_inflections() {
        assert_eq!(stem("go"), stem("goes"));
        assert_eq!(stem("eat"), stem("ate"));
        // Irregulares miram no stem da base, não na base em si
        assert_eq!(stem("took"), stem("take"));
        assert_eq!(stem("has"), stem("have"));
        assert_eq!(stem("saw"), stem("sees"));
        assert_eq!(stem("cat"), stem("cats"));
        assert_eq!(stem("study"), stem("studies"));
        assert_eq!(stem("was"), "be");
    }

    #[test]
    fn test_stem_does_not_collide_unrelated() {
        assert_ne!(stem("cat"), stem("dog"));
        assert_ne!(stem("school"), stem("friend"));
    }
}
