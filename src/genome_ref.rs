use std::collections::HashMap;
use std::fs::File;
use std::io::Read;

use bio::io::fasta;
use log::info;
use simple_error::{SimpleResult, bail};

/// Reference contig sequences, looked up by contig name
///
/// This is loaded once before the alignment scan begins and only read afterward.
///
#[derive(Default)]
pub struct GenomeRef {
    /// A map from chrom name to chrom sequence
    pub chroms: HashMap<String, Vec<u8>>,
}

impl GenomeRef {
    /// Scan all GenomeRef seqeunces and convert any characters not in the allowed list to the unknown character
    ///
    pub fn convert_disallowed_characters(&mut self, allowed: &[u8], unknown: u8) {
        let allowed_lut = {
            // Build a lookup table for all possible u8 values
            const TYPE_WIDTH: usize = (u8::MAX as usize) + 1;
            let mut x = [false; TYPE_WIDTH];
            for &c in allowed.iter() {
                x[c as usize] = true;
            }
            x
        };
        for seq in self.chroms.values_mut() {
            for c in seq.iter_mut().filter(|x| !allowed_lut[**x as usize]) {
                *c = unknown;
            }
        }
    }

    /// Convert all bases besides "ACGTN" to "N"
    pub fn simplify_ambiguous_dna_bases(&mut self) {
        self.convert_disallowed_characters(b"ACGTN", b'N');
    }

    pub fn total_size(&self) -> usize {
        self.chroms.values().map(|x| x.len()).sum()
    }
}

/// Read fasta records into GenomeRef data structure
///
/// This method converts all input characters to upper-case
///
pub fn get_genome_ref_from_fasta_reader<R: Read>(reader: R) -> SimpleResult<GenomeRef> {
    let reader = fasta::Reader::new(reader);

    let mut genome_ref = GenomeRef::default();

    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(x) => x,
            Err(e) => bail!("Error parsing fasta record {}: {e}", index + 1),
        };

        let chrom = record.id().to_string();
        if genome_ref.chroms.contains_key(&chrom) {
            bail!("Duplicate sequence name in fasta file: '{chrom}'");
        }
        genome_ref
            .chroms
            .insert(chrom, record.seq().to_ascii_uppercase());
    }
    Ok(genome_ref)
}

/// Read fasta file into GenomeRef data structure
///
/// This method converts all input characters to upper-case, and all characters besides "ACGTN"
/// to "N".
///
pub fn get_genome_ref_from_fasta(filename: &str) -> SimpleResult<GenomeRef> {
    info!("Reading reference genome from file '{filename}'");

    let file = match File::open(filename) {
        Ok(x) => x,
        Err(e) => bail!("Unable to open reference fasta file: '{filename}': {e}"),
    };

    let mut genome_ref = get_genome_ref_from_fasta_reader(file)?;
    genome_ref.simplify_ambiguous_dna_bases();

    info!(
        "Read {} reference sequences with total length {}",
        genome_ref.chroms.len(),
        genome_ref.total_size()
    );
    Ok(genome_ref)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, SeekFrom, Write};
    use unwrap::unwrap;

    #[test]
    fn test_get_genome_ref_from_fasta_reader() {
        let mut file = tempfile::tempfile().unwrap();

        let cname = "foo";
        let seq = "ACGTacgt";
        writeln!(file, ">{cname} description").unwrap();
        writeln!(file, "{seq}").unwrap();
        writeln!(file, ">bar").unwrap();
        writeln!(file, "NNNN").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        let result = unwrap!(get_genome_ref_from_fasta_reader(file));

        assert_eq!(result.chroms.len(), 2);
        assert_eq!(result.chroms[cname], b"ACGTACGT".to_vec());
        assert_eq!(result.total_size(), 12);
    }

    #[test]
    fn test_duplicate_fasta_names() {
        let fasta = b">foo\nACGT\n>foo\nACGT\n";
        assert!(get_genome_ref_from_fasta_reader(&fasta[..]).is_err());
    }

    #[test]
    fn test_simplify_ambiguous_dna_bases() {
        let mut chroms = HashMap::default();
        chroms.insert(String::from("foo"), b"ACGT1234acgtNNNNMMMM".to_vec());
        let mut genome_ref = GenomeRef { chroms };

        genome_ref.simplify_ambiguous_dna_bases();

        assert_eq!(genome_ref.chroms["foo"], b"ACGTNNNNNNNNNNNNNNNN".to_vec());
    }
}
