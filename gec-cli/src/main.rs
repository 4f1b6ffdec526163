//! Conversor de linha de comando: dois arquivos de texto paralelo (original e
//! corrigido, uma sentença por linha) viram um arquivo M2 com as edições
//! classificadas.
//!
//! Uso típico:
//!
//! ```text
//! parallel-to-m2 --orig orig.txt --cor cor.txt --out saida.m2
//! parallel-to-m2 --orig orig.txt --cor cor.txt --out saida.m2 --merge all-split --jobs 4
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use gec_core::m2::FormatOptions;
use gec_core::{
    AlignmentMode, ConvertOptions, Converter, HeuristicAnnotator, LexicalResources,
    MergePolicy,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "parallel-to-m2", version, about = "Converte texto paralelo original/corrigido para o formato M2")]
struct Args {
    /// Arquivo com as sentenças originais, uma por linha.
    #[arg(long)]
    orig: PathBuf,

    /// Arquivo com as sentenças corrigidas, uma por linha.
    #[arg(long)]
    cor: PathBuf,

    /// Arquivo M2 de saída.
    #[arg(long)]
    out: PathBuf,

    /// Usa Levenshtein padrão (custo fixo) em vez do alinhamento ponderado.
    #[arg(long)]
    lev: bool,

    /// Política de fusão das operações elementares.
    #[arg(long, value_enum, default_value_t = MergeArg::Rules)]
    merge: MergeArg,

    /// Delimitador dos traços por token nas linhas S/T (padrão: só o texto).
    #[arg(long)]
    feature_delimiter: Option<String>,

    /// O lado original já vem tokenizado por espaço; reanexa pontuação e
    /// contrações antes de anotar.
    #[arg(long)]
    detok_orig: bool,

    /// Idem para o lado corrigido.
    #[arg(long)]
    detok_cor: bool,

    /// Número de workers; 1 = sequencial.
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Lista de palavras externa (padrão: a embutida). Exige --tag-map.
    #[arg(long)]
    word_list: Option<PathBuf>,

    /// Tag map externo (padrão: o embutido). Exige --word-list.
    #[arg(long)]
    tag_map: Option<PathBuf>,

    /// Identificador do anotador nas linhas A.
    #[arg(long, default_value_t = 0)]
    coder_id: u32,
}

/// Espelho do [`MergePolicy`] com os nomes da linha de comando.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum MergeArg {
    Rules,
    AllSplit,
    AllMerge,
    AllEqual,
}

impl From<MergeArg> for MergePolicy {
    fn from(arg: MergeArg) -> Self {
        match arg {
            MergeArg::Rules => MergePolicy::Rules,
            MergeArg::AllSplit => MergePolicy::AllSplit,
            MergeArg::AllMerge => MergePolicy::AllMerge,
            MergeArg::AllEqual => MergePolicy::AllEqual,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let args = Args::parse();

    // Recursos: ou o par embutido, ou o par externo completo.
    let resources = match (&args.word_list, &args.tag_map) {
        (None, None) => LexicalResources::builtin(),
        (Some(words), Some(tags)) => LexicalResources::from_files(words, tags)?,
        _ => bail!("--word-list e --tag-map andam juntos: informe os dois ou nenhum"),
    };
    let resources = Arc::new(resources);
    info!(
        "recursos carregados: {} palavras, {} tags",
        resources.word_list_len(),
        resources.tag_map_len()
    );

    let orig_text = fs::read_to_string(&args.orig)
        .with_context(|| format!("não foi possível ler {}", args.orig.display()))?;
    let cor_text = fs::read_to_string(&args.cor)
        .with_context(|| format!("não foi possível ler {}", args.cor.display()))?;

    let orig_lines: Vec<&str> = orig_text.lines().collect();
    let cor_lines: Vec<&str> = cor_text.lines().collect();
    if orig_lines.len() != cor_lines.len() {
        warn!(
            "arquivos com tamanhos diferentes ({} vs {} linhas); o excedente será ignorado",
            orig_lines.len(),
            cor_lines.len()
        );
    }
    let pairs: Vec<(String, String)> = orig_lines
        .iter()
        .zip(cor_lines.iter())
        .map(|(o, c)| (o.to_string(), c.to_string()))
        .collect();
    info!("{} pares de sentenças lidos", pairs.len());

    let options = ConvertOptions {
        mode: if args.lev { AlignmentMode::Levenshtein } else { AlignmentMode::Damerau },
        policy: args.merge.into(),
        feature_delimiter: args.feature_delimiter.clone(),
        detokenize_orig: args.detok_orig,
        detokenize_cor: args.detok_cor,
        coder_id: args.coder_id,
    };
    let format = FormatOptions {
        feature_delimiter: options.feature_delimiter.clone(),
        coder_id: options.coder_id,
    };

    let provider = HeuristicAnnotator::new(Arc::clone(&resources));
    let converter = Converter::new(provider, resources, options);

    let outcome = converter.convert_all(&pairs, args.jobs);

    for skip in &outcome.skipped {
        warn!(
            "par {} pulado ({}): S={:?} T={:?}",
            skip.index, skip.reason, skip.orig, skip.cor
        );
    }

    let mut output = String::new();
    for record in &outcome.records {
        output.push_str(&record.to_m2(&format));
        output.push_str("\n\n");
    }
    fs::write(&args.out, output)
        .with_context(|| format!("não foi possível escrever {}", args.out.display()))?;

    let summary = outcome.summary();
    info!(
        "concluído: {}",
        serde_json::to_string(&summary).unwrap_or_else(|_| format!("{summary:?}"))
    );
    Ok(())
}
