// crates/em-launch-cli/src/bin/run_inference.rs
// ============================================================================
// Module: RFdiffusion Inference Wrapper
// Description: Site entry point for containerized RFdiffusion inference.
// Purpose: Validate the container image and delegate to the inference script.
// Dependencies: em-launch-cli
// ============================================================================

//! Runs `run_inference.py` inside the configured container image, forwarding
//! every argument verbatim.

use std::process::ExitCode;

/// Wrapper entry point returning the delegated exit code.
fn main() -> ExitCode {
    em_launch_cli::wrapper::inference_main()
}
