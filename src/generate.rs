use std::{io, path::PathBuf, time::{SystemTime, UNIX_EPOCH}};

use clap::{Args, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use rand_distr::{Uniform, Normal, Distribution};

use crate::convert::write_atomically;
use crate::error::MinPolResult;
use crate::instance::{InstanceSpec, RESISTANCE_LEVELS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Txt,
    Json,
    Dzn,
}

#[derive(Debug, Args)]
pub struct MinPolGenerator {
    /// An optional seed to kickstart the instance generation
    #[clap(short='s', long)]
    seed: Option<u128>,
    /// The number of people
    #[clap(short='n', long, default_value="10")]
    nb_people: u64,
    /// The number of opinions
    #[clap(short='m', long, default_value="3")]
    nb_opinions: usize,
    /// The mean of the maximum total cost
    #[clap(long, default_value="25")]
    ct_mean: f64,
    /// The std deviation of the maximum total cost
    #[clap(long, default_value="5")]
    ct_std_dev: f64,
    /// The maximum number of moves
    #[clap(long, default_value="5")]
    max_movs: i64,
    /// The format of the generated instance
    #[clap(short, long, value_enum, default_value="txt")]
    format: OutputFormat,
    /// Name of the file where to generate the instance
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl MinPolGenerator {

    pub fn generate(&mut self) -> MinPolResult<InstanceSpec> {
        if self.nb_opinions == 0 {
            log::warn!("at least one opinion is needed, using 1");
            self.nb_opinions = 1;
        }
        if self.nb_people == 0 {
            log::warn!("at least one person is needed, using 1");
            self.nb_people = 1;
        }
        if !self.ct_mean.is_finite() {
            log::warn!("invalid cost mean {}, using 0", self.ct_mean);
            self.ct_mean = 0.0;
        }
        if !(self.ct_std_dev.is_finite() && self.ct_std_dev >= 0.0) {
            log::warn!("invalid cost std deviation {}, using 0", self.ct_std_dev);
            self.ct_std_dev = 0.0;
        }

        let mut rng = self.rng();

        let p = self.generate_distribution(&mut rng);
        let v = self.generate_values(&mut rng);
        let resistance = self.generate_resistances(&mut rng, &p);
        let ct = self.generate_cost(&mut rng);

        let instance = InstanceSpec {
            n: self.nb_people,
            m: self.nb_opinions,
            p,
            v,
            resistance,
            ct,
            max_movs: self.max_movs,
        };

        let rendered = match self.format {
            OutputFormat::Txt => instance.to_txt(),
            OutputFormat::Json => serde_json::to_string_pretty(&instance).map_err(io::Error::from)?,
            OutputFormat::Dzn => instance.to_dzn(),
        };

        if let Some(output) = self.output.as_ref() {
            write_atomically(output, &rendered)?;
            log::info!("instance written to {}", output.display());
        } else {
            println!("{rendered}");
        }
        Ok(instance)
    }

    fn generate_distribution(&self, rng: &mut impl Rng) -> Vec<i64> {
        let mut p = vec![0; self.nb_opinions];
        let rand_opinion = Uniform::new(0, self.nb_opinions);
        for _ in 0..self.nb_people {
            p[rand_opinion.sample(rng)] += 1;
        }
        p
    }

    fn generate_values(&self, rng: &mut impl Rng) -> Vec<f64> {
        let rand_value = Uniform::new_inclusive(0, 1000);
        (0..self.nb_opinions)
            .map(|_| rand_value.sample(rng) as f64 / 1000.0)
            .collect()
    }

    fn generate_resistances(&self, rng: &mut impl Rng, p: &[i64]) -> Vec<[i64; RESISTANCE_LEVELS]> {
        let rand_level = Uniform::new(0, RESISTANCE_LEVELS);
        p.iter()
            .map(|people| {
                let mut row = [0; RESISTANCE_LEVELS];
                for _ in 0..*people {
                    row[rand_level.sample(rng)] += 1;
                }
                row
            })
            .collect()
    }

    fn generate_cost(&self, rng: &mut impl Rng) -> f64 {
        match Normal::new(self.ct_mean, self.ct_std_dev) {
            Ok(rand_cost) => rand_cost.sample(rng).round().max(0.0),
            Err(_) => self.ct_mean.max(0.0),
        }
    }

    fn rng(&self) -> impl Rng {
        let init = self.seed.unwrap_or_else(|| {
            SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default()
        });
        let mut seed = [0_u8; 32];
        seed.iter_mut().zip(init.to_be_bytes().into_iter()).for_each(|(s, i)| *s = i);
        seed.iter_mut().rev().zip(init.to_le_bytes().into_iter()).for_each(|(s, i)| *s = i);
        ChaChaRng::from_seed(seed)
    }

}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;
    use tempfile::TempDir;

    use super::*;

    fn generator(seed: u128, nb_people: u64, nb_opinions: usize) -> MinPolGenerator {
        MinPolGenerator {
            seed: Some(seed),
            nb_people,
            nb_opinions,
            ct_mean: 25.0,
            ct_std_dev: 5.0,
            max_movs: 5,
            format: OutputFormat::Txt,
            output: None,
        }
    }

    #[test]
    fn same_seed_same_instance() {
        let a = generator(42, 50, 5).generate().unwrap();
        let b = generator(42, 50, 5).generate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn generated_instances_are_consistent() {
        for seed in 0..20 {
            let instance = generator(seed, 30, 1 + seed as usize % 7).generate().unwrap();
            instance.validate().unwrap();
            assert_eq!(instance.p.iter().sum::<i64>(), 30);
            for (people, row) in instance.p.iter().zip(&instance.resistance) {
                assert_eq!(row.iter().sum::<i64>(), *people);
            }
            assert!(instance.v.iter().all(|v| (0.0..=1.0).contains(v)));
            assert!(instance.ct >= 0.0);
        }
    }

    #[test]
    fn written_file_converts() {
        let tmp = TempDir::new().unwrap();
        let mut gen = generator(107, 12, 4);
        gen.output = Some(tmp.path().join("instance.txt"));
        let instance = gen.generate().unwrap();
        let content = std::fs::read_to_string(gen.output.as_ref().unwrap()).unwrap();
        assert_eq!(InstanceSpec::parse_txt(&content).unwrap(), instance);
    }

    #[test]
    fn degenerate_parameters_are_repaired() {
        let mut gen = generator(103, 0, 0);
        gen.ct_std_dev = -1.0;
        let instance = gen.generate().unwrap();
        assert_eq!((instance.n, instance.m), (1, 1));
        assert_eq!(instance.ct, 25.0);
    }

    #[test]
    fn non_finite_cost_mean_is_repaired() {
        for mean in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let mut gen = generator(104, 10, 3);
            gen.ct_mean = mean;
            let instance = gen.generate().unwrap();
            instance.validate().unwrap();
            assert!(instance.ct.is_finite());
        }
    }

    #[test]
    fn json_output_reads_back() {
        let tmp = TempDir::new().unwrap();
        let mut gen = generator(105, 20, 6);
        gen.format = OutputFormat::Json;
        gen.output = Some(tmp.path().join("instance.json"));
        let instance = gen.generate().unwrap();

        let content = std::fs::read_to_string(gen.output.as_ref().unwrap()).unwrap();
        let read: InstanceSpec = serde_json::from_str(&content).unwrap();
        assert_eq!(read.p, instance.p);
        for (a, b) in read.v.iter().zip(&instance.v) {
            assert_float_eq!(*a, *b, ulps <= 1);
        }
        assert_float_eq!(read.ct, instance.ct, ulps <= 1);
    }
}
