//! Interactive first-run setup of the config file.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use tracing::info;

use crate::config::Config;
use crate::llm::ProviderRegistry;

/// Prompt for provider, endpoint, API key, and model, then write the config.
///
/// An existing config file is left alone.
pub async fn run(config_path: &Path, registry: &ProviderRegistry) -> Result<()> {
    match tokio::fs::metadata(config_path).await {
        Ok(meta) if meta.is_dir() => bail!("{} is directory", config_path.display()),
        Ok(_) => {
            info!(path = %config_path.display(), "Config already exists");
            return Ok(());
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("{}: error", config_path.display()));
        }
    }

    let mut editor = Reedline::create();
    let names = registry.names();
    let provider = select_provider(&mut editor, &names)?;
    let endpoint = prompt_line(&mut editor, "endpoint")?;
    let api_key = prompt_line(&mut editor, "api_key")?;
    let model = prompt_line(&mut editor, "model")?;

    let config = Config {
        provider,
        endpoint: endpoint.trim().to_string(),
        api_key: api_key.trim().to_string(),
        model: model.trim().to_string(),
        max_tokens: None,
    };
    config.save(config_path).await?;

    println!("{} created", config_path.display());
    Ok(())
}

/// Read one line; Ctrl-C / Ctrl-D abort.
pub(super) fn prompt_line(editor: &mut Reedline, label: &str) -> Result<String> {
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(label.to_string()),
        DefaultPromptSegment::Empty,
    );
    match editor.read_line(&prompt)? {
        Signal::Success(line) => Ok(line),
        _ => Err(anyhow!("{label}: cancelled")),
    }
}

fn select_provider(editor: &mut Reedline, names: &[String]) -> Result<String> {
    for (i, name) in names.iter().enumerate() {
        eprintln!("  {}) {}", i + 1, name);
    }
    loop {
        let answer = prompt_line(editor, "provider")?;
        match parse_provider_choice(&answer, names) {
            Some(name) => return Ok(name),
            None => eprintln!("unknown provider: {}", answer.trim()),
        }
    }
}

/// Accept either a 1-based list index or a provider name.
fn parse_provider_choice(answer: &str, names: &[String]) -> Option<String> {
    let answer = answer.trim();
    if let Ok(index) = answer.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| names.get(i))
            .cloned();
    }
    names.iter().find(|n| n.as_str() == answer).cloned()
}
