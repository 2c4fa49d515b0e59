//! VcfApplicator CLI entry point
//!
//! Thin wrapper over the library: decodes a VCF file and applies its
//! variants to reference sequences, or prints file metadata.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use vcf_applicator::formats::fasta::{write_fasta, FastaReader};
use vcf_applicator::{codes_from_str, codes_to_string, VcfData};

/// Which haplotype copy to apply (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum AlleleArg {
    /// Primary allele (index 0)
    #[default]
    #[value(name = "primary")]
    Primary,
    /// Secondary allele (index 1)
    #[value(name = "secondary")]
    Secondary,
}

impl AlleleArg {
    fn index(self) -> usize {
        match self {
            AlleleArg::Primary => 0,
            AlleleArg::Secondary => 1,
        }
    }
}

#[derive(Parser)]
#[command(name = "vcf-applicator")]
#[command(about = "VCF decoding and allele-specific genome application")]
#[command(version)]
#[command(author = "VcfApplicator Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply VCF variants to reference sequences
    Apply {
        /// Input VCF file
        vcf: PathBuf,
        /// Reference genome FASTA file
        fasta: PathBuf,
        /// Output FASTA file (optional, stdout if not specified)
        output: Option<PathBuf>,
        /// Which haplotype copy to apply
        #[arg(short = 'a', long, default_value = "primary")]
        allele: AlleleArg,
        /// Restrict application to one chromosome
        #[arg(short = 'c', long)]
        chromosome: Option<String>,
    },
    /// Print VCF metadata and record statistics
    Info {
        /// Input VCF file
        vcf: PathBuf,
    },
}

fn load_vcf(path: &PathBuf) -> anyhow::Result<VcfData> {
    let start = Instant::now();
    eprintln!("Loading VCF file: {:?}", path);
    let data = VcfData::from_path(path)
        .map_err(|e| anyhow::anyhow!("Failed to load VCF file: {}", e))?;
    eprintln!(
        "VCF file loaded in {:.2}s ({} records)",
        start.elapsed().as_secs_f64(),
        data.record_count()
    );
    Ok(data)
}

fn run_apply(
    vcf: PathBuf,
    fasta: PathBuf,
    output: Option<PathBuf>,
    allele: AlleleArg,
    chromosome: Option<String>,
) -> anyhow::Result<()> {
    let data = load_vcf(&vcf)?;
    let reference = FastaReader::open(&fasta)
        .map_err(|e| anyhow::anyhow!("Failed to load FASTA file: {}", e))?;

    let names: Vec<String> = match chromosome {
        Some(name) => {
            if reference.fetch(&name).is_none() {
                anyhow::bail!("Chromosome not present in FASTA file: {}", name);
            }
            vec![name]
        }
        None => reference.names().map(str::to_string).collect(),
    };

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    let applicator = data.applicator();
    let allele_applicator = applicator.using_allele(allele.index());
    let start = Instant::now();
    for name in &names {
        let sequence = reference
            .fetch(name)
            .ok_or_else(|| anyhow::anyhow!("Chromosome not present in FASTA file: {}", name))?;
        let codes = codes_from_str(sequence)?;
        let transduced: Result<Vec<_>, _> = allele_applicator
            .apply_to_sequence(name, codes)?
            .collect();
        write_fasta(&mut writer, name, &codes_to_string(transduced?))?;
    }
    writer.flush()?;
    eprintln!(
        "Applied {} sequence(s) in {:.2}s",
        names.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn run_info(vcf: PathBuf) -> anyhow::Result<()> {
    let data = load_vcf(&vcf)?;
    let meta = data.meta_info();
    println!("fileformat: {}", meta.file_format().unwrap_or("-"));
    println!("fileDate:   {}", meta.file_date().unwrap_or("-"));
    println!("reference:  {}", meta.reference().unwrap_or("-"));
    println!(
        "build:      {}",
        meta.parsed_human_reference_genome()
            .unwrap_or_else(|| "-".to_string())
    );
    match data.applicator().number_of_alleles() {
        Ok(alleles) => println!("alleles:    {}", alleles),
        Err(vcf_applicator::ApplyError::NoRecords) => println!("alleles:    - (no variants)"),
        Err(error) => return Err(error.into()),
    }
    println!("records:    {}", data.record_count());
    for chromosome in data.chromosomes() {
        println!(
            "  {}: {}",
            chromosome,
            data.records_for_chromosome(chromosome).len()
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            vcf,
            fasta,
            output,
            allele,
            chromosome,
        } => run_apply(vcf, fasta, output, allele, chromosome),
        Commands::Info { vcf } => run_info(vcf),
    }
}
