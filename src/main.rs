//! Renders a parameter file to a mono WAV file.

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use trackdraw::{SynthesisMethod, SynthesisParameters, Waveform, synthesize};

/// Peak level of the written file.
const OUTPUT_PEAK: f64 = 0.9;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliMethod {
    Klatt,
    Sine,
}

impl From<CliMethod> for SynthesisMethod {
    fn from(m: CliMethod) -> Self {
        match m {
            CliMethod::Klatt => SynthesisMethod::Klatt,
            CliMethod::Sine => SynthesisMethod::Sine,
        }
    }
}

#[derive(Parser)]
#[command(name = "trackdraw")]
#[command(version, about = "Synthesize drawn pitch and formant tracks", long_about = None)]
struct Cli {
    /// TOML file with synthesis parameters; missing fields keep their defaults
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// Synthesis method, overrides the parameter file
    #[arg(long, value_enum)]
    method: Option<CliMethod>,

    /// Noise seed, overrides the parameter file
    #[arg(long)]
    seed: Option<u64>,

    /// Bits per sample: 16 for integer PCM, 32 for float
    #[arg(long, default_value = "16")]
    bits: u16,

    /// Output WAV file
    #[arg(long, short, value_name = "OUTPUT")]
    output: PathBuf,
}

fn load_params(path: Option<&Path>) -> anyhow::Result<SynthesisParameters> {
    let Some(path) = path else {
        return Ok(SynthesisParameters::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_wav(path: &Path, waveform: &Waveform, bits: u16) -> anyhow::Result<()> {
    let sample_rate =
        u32::try_from(waveform.sample_rate()).context("sample rate does not fit a WAV header")?;
    let sample_format = match bits {
        16 => hound::SampleFormat::Int,
        32 => hound::SampleFormat::Float,
        other => bail!("unsupported bit depth {other}, use 16 or 32"),
    };
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: bits,
        sample_format,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("creating {}", path.display()))?;
    if bits == 16 {
        for s in waveform.to_pcm_i16() {
            writer.write_sample(s)?;
        }
    } else {
        for s in waveform.to_pcm_f32() {
            writer.write_sample(s)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let mut params = load_params(cli.params.as_deref())?;
    if let Some(method) = cli.method {
        params.method = method.into();
    }
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }

    let waveform = synthesize(&params)?.normalized(OUTPUT_PEAK);
    write_wav(&cli.output, &waveform, cli.bits)?;
    tracing::info!(
        path = %cli.output.display(),
        samples = waveform.len(),
        seconds = waveform.duration_secs(),
        "wrote waveform"
    );
    Ok(())
}
