mod cli;
mod steps;
mod workflow;
