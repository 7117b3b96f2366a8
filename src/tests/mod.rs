mod credentials;
mod lock_gate;
