mod steps;
mod workflow;
