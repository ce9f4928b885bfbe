/// Link-architecture delay/success models (§4.5).
///
/// Each variant exposes two pure functions: `success_prob` (per-attempt
/// probability) and `delays` (the three durations measured from
/// RESERVE_QUBIT_OK at the primary node).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkArchitecture {
    /// Sender-Receiver.
    Sr,
    /// Source-in-Midpoint.
    Sim,
    /// Detection-in-Midpoint with Barrett-Kok.
    DimBk,
    /// DIM-BK with SeQUeNCe-style reservation timing.
    DimBkSeq,
}

/// `(epr_creation, notify_primary, notify_secondary)`, all in seconds.
pub type Delays = (f64, f64, f64);

impl LinkArchitecture {
    /// Per-attempt success probability for a link of `length` km with
    /// fiber loss `alpha` dB/km, source efficiency `eta_s` and detector
    /// efficiency `eta_d`.
    pub fn success_prob(&self, length: f64, alpha: f64, eta_s: f64, eta_d: f64) -> f64 {
        match self {
            LinkArchitecture::Sr => {
                let p_l_sr = 10f64.powf(-alpha * length / 10.0);
                eta_s * eta_d * p_l_sr
            }
            LinkArchitecture::Sim => {
                let p_l_sb = 10f64.powf(-alpha * length / 20.0);
                (eta_d * p_l_sb).powi(2)
            }
            LinkArchitecture::DimBk | LinkArchitecture::DimBkSeq => {
                let p_bsa = 0.5;
                let p_l_sb = 10f64.powf(-alpha * length / 20.0);
                let eta_sb = eta_s * eta_d * p_l_sb;
                p_bsa * eta_sb.powi(2)
            }
        }
    }

    /// `attempt_duration` in seconds for one attempt, given the source
    /// reset time and propagation/local-operation delays.
    pub fn attempt_duration(&self, reset_time: f64, tau_l: f64, tau_0: f64) -> f64 {
        match self {
            LinkArchitecture::Sr | LinkArchitecture::DimBk => (2.0 * (tau_l + tau_0)).max(reset_time),
            LinkArchitecture::Sim => (tau_l + tau_0).max(reset_time),
            LinkArchitecture::DimBkSeq => (5.0 * (tau_l + tau_0)).max(reset_time),
        }
    }

    /// Delays for the `k`-th attempt (`k >= 1`), measured from
    /// RESERVE_QUBIT_OK at the primary node.
    pub fn delays(&self, k: u64, reset_time: f64, tau_l: f64, tau_0: f64) -> Delays {
        let a = self.attempt_duration(reset_time, tau_l, tau_0);
        let k = k as f64;
        match self {
            LinkArchitecture::Sr => (k * a - 2.0 * tau_l, tau_l, 2.0 * tau_l),
            LinkArchitecture::Sim => (k * a - tau_l, tau_l, tau_l),
            LinkArchitecture::DimBk => {
                let notify = 2.0 * tau_l + tau_0;
                (k * a - 2.0 * tau_l - tau_0, notify, notify)
            }
            LinkArchitecture::DimBkSeq => {
                let notify = 4.0 * tau_l + tau_0;
                ((k - 1.0) * a + tau_l + 4.0 * tau_0, notify, notify)
            }
        }
    }
}
