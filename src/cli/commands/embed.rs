//! cvm embed - Test the embedding backend
//!
//! Utility command for inspecting vectors and pairwise similarity.

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{colored_score, emit_robot, robot_ok};
use crate::error::Result;
use crate::search::{Embedder, build_embedder, cosine_similarity, overlap_score};

#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// Text to embed
    pub text: String,

    /// Override embedding backend
    #[arg(long, short)]
    pub backend: Option<String>,

    /// Show full embedding vector (default: summary only)
    #[arg(long)]
    pub full: bool,

    /// Compare with another text (cosine and keyword overlap)
    #[arg(long, short)]
    pub compare: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct VectorStats {
    min: f32,
    max: f32,
    mean: f32,
    l2_norm: f32,
    non_zero_count: usize,
}

fn vector_stats(embedding: &[f32]) -> VectorStats {
    let (min, max, sum) = embedding
        .iter()
        .fold((f32::MAX, f32::MIN, 0.0f32), |acc, &x| {
            (acc.0.min(x), acc.1.max(x), acc.2 + x)
        });
    VectorStats {
        min,
        max,
        mean: sum / embedding.len().max(1) as f32,
        l2_norm: embedding.iter().map(|x| x * x).sum::<f32>().sqrt(),
        non_zero_count: embedding.iter().filter(|&&x| x.abs() > 1e-10).count(),
    }
}

pub fn run(ctx: &AppContext, args: &EmbedArgs) -> Result<()> {
    let built;
    let embedder: &dyn Embedder = if let Some(backend) = &args.backend {
        let mut config = ctx.config.search.clone();
        config.embedding_backend.clone_from(backend);
        built = build_embedder(&config)?;
        built.as_ref()
    } else {
        ctx.embedder()?
    };

    let embedding = embedder.embed(&args.text)?;
    let stats = vector_stats(&embedding);
    // A zero vector has no defined cosine; report it as absent.
    let comparison = match args.compare.as_ref() {
        Some(other) => {
            let cosine = cosine_similarity(&embedding, &embedder.embed(other)?).ok();
            Some((other, cosine, overlap_score(&args.text, other)))
        }
        None => None,
    };

    if ctx.robot_mode {
        let mut output = serde_json::json!({
            "backend": embedder.name(),
            "dimensions": embedder.dims(),
            "input": args.text,
            "stats": stats,
        });
        if args.full {
            output["embedding"] = serde_json::json!(embedding);
        }
        if let Some((text_b, cosine, keyword)) = comparison {
            output["comparison"] = serde_json::json!({
                "text_b": text_b,
                "cosine_similarity": cosine,
                "keyword_overlap": keyword,
            });
        }
        return emit_robot(&robot_ok(output));
    }

    println!("{}", "Embedding Configuration".bold());
    println!("  Backend: {}", embedder.name().cyan());
    println!("  Dimensions: {}", embedder.dims().to_string().cyan());
    println!();

    println!("{}", "Embedding Result".bold());
    println!("  Min: {:.6}", stats.min);
    println!("  Max: {:.6}", stats.max);
    println!("  Mean: {:.6}", stats.mean);
    println!("  L2 Norm: {:.6}", stats.l2_norm);
    println!(
        "  Non-zero: {} ({:.1}%)",
        stats.non_zero_count,
        100.0 * stats.non_zero_count as f32 / embedding.len().max(1) as f32
    );

    if args.full {
        println!();
        println!("{}", "Full Vector".bold());
        for (i, v) in embedding.iter().enumerate() {
            if i > 0 && i % 8 == 0 {
                println!();
            }
            print!("{v:8.5} ");
        }
        println!();
    }

    if let Some((text_b, cosine, keyword)) = comparison {
        println!();
        println!("{}", "Similarity Comparison".bold());
        println!("  Text A: \"{}\"", args.text.green());
        println!("  Text B: \"{}\"", text_b.green());
        println!(
            "  Cosine Similarity: {}",
            cosine.map_or_else(|| "undefined (zero vector)".to_string(), colored_score)
        );
        println!("  Keyword Overlap: {}", colored_score(keyword));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_stats_basic() {
        let stats = vector_stats(&[3.0, 0.0, -4.0]);
        assert_eq!(stats.min, -4.0);
        assert_eq!(stats.max, 3.0);
        assert!((stats.l2_norm - 5.0).abs() < 1e-6);
        assert_eq!(stats.non_zero_count, 2);
    }

    #[test]
    fn vector_stats_empty_vector_has_zero_mean() {
        let stats = vector_stats(&[]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.non_zero_count, 0);
    }
}
