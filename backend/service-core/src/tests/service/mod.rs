mod candidates;
mod root;
mod transfer;
