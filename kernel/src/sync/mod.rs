pub mod cpu_cli;
