pub mod rna;
