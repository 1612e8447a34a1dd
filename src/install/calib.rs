//! Parallel processing configuration for Etomo
//!
//! Defines a CPU and a GPU queue dispatched through SLURM via `queuechunk`.
//! The file is identical for every install.

/// File name, written under `<prefix>/ImodCalib`
pub const CPU_ADOC_NAME: &str = "cpu.adoc";

/// Literal contents of `cpu.adoc` (no trailing newline)
pub const CPU_ADOC: &str = "\
# See https://bio3d.colorado.edu/imod/doc/man/cpuadoc.html
# and https://bio3d.colorado.edu/imod/nightlyBuilds/IMOD/autodoc/cpu.adoc
# for details and other ways parallel processes through Etomo
# can be implemented (e.g. for standalone computers or pbs, pbs-maui,
# or sge cluster queues)
Version = 1.2
#
[Queue = CPU]
# make the cpu partition available
command = queuechunk -t slurm -l -n1,-c1,--partition=cpu
number = 128
#
[Queue = GPU]
# schedule jobs for the gpu partition
gpu = 1
command = queuechunk -t slurm -l -n1,-c1,--gres=gpu:2,--partition=gpu";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines_two_queues() {
        let queues: Vec<_> = CPU_ADOC
            .lines()
            .filter(|l| l.starts_with("[Queue = "))
            .collect();
        assert_eq!(queues, vec!["[Queue = CPU]", "[Queue = GPU]"]);
    }

    #[test]
    fn fixed_keys() {
        assert!(CPU_ADOC.lines().any(|l| l == "Version = 1.2"));
        assert!(CPU_ADOC.lines().any(|l| l == "number = 128"));
        assert!(CPU_ADOC.lines().any(|l| l == "gpu = 1"));
        assert_eq!(
            CPU_ADOC.lines().filter(|l| l.starts_with("command = ")).count(),
            2
        );
    }

    #[test]
    fn starts_with_comment_and_has_no_trailing_newline() {
        assert!(CPU_ADOC.starts_with("# See https://"));
        assert!(CPU_ADOC.ends_with("--partition=gpu"));
        assert_eq!(CPU_ADOC.lines().count(), 16);
    }
}
