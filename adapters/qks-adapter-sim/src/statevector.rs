//! Statevector simulation engine.

use num_complex::Complex64;
use rand::Rng;

/// A statevector over `num_qubits` qubits.
///
/// Basis index bit `q` holds the value of qubit `q`.
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    fn dim(&self) -> usize {
        1 << self.num_qubits
    }

    // =========================================================================
    // Single-qubit rotations
    // =========================================================================

    pub fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let neg_i_s = Complex64::new(0.0, -(theta / 2.0).sin());
        for i in 0..self.dim() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    pub fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..self.dim() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    pub fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            *amp *= if i & mask == 0 { phase_0 } else { phase_1 };
        }
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    pub fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..self.dim() {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    pub fn apply_cz(&mut self, a: usize, b: usize) {
        let mask = (1 << a) | (1 << b);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask == mask {
                *amp = -*amp;
            }
        }
    }

    /// Probability of every basis state.
    #[cfg(test)]
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Sample a basis state from the measurement distribution.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let r: f64 = rng.r#gen();

        let mut cumulative = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            cumulative += amp.norm_sqr();
            if r < cumulative {
                return i;
            }
        }

        // Rounding can leave the total just under 1.
        self.amplitudes.len() - 1
    }
}

/// Value of `qubit` in basis state `outcome`.
pub fn qubit_bit(outcome: usize, qubit: usize) -> u8 {
    ((outcome >> qubit) & 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::PI;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert_eq!(sv.probabilities(), vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rx_pi_flips() {
        let mut sv = Statevector::new(1);
        sv.apply_rx(0, PI);
        let p = sv.probabilities();
        assert!(approx_eq(p[0], 0.0));
        assert!(approx_eq(p[1], 1.0));
    }

    #[test]
    fn test_ry_half_turn_is_balanced() {
        let mut sv = Statevector::new(1);
        sv.apply_ry(0, PI / 2.0);
        let p = sv.probabilities();
        assert!(approx_eq(p[0], 0.5));
        assert!(approx_eq(p[1], 0.5));
    }

    #[test]
    fn test_rz_keeps_populations() {
        let mut sv = Statevector::new(1);
        sv.apply_rx(0, 1.1);
        let before = sv.probabilities();
        sv.apply_rz(0, 0.7);
        let after = sv.probabilities();
        assert!(approx_eq(before[0], after[0]));
        assert!(approx_eq(before[1], after[1]));
    }

    #[test]
    fn test_cx_after_flip() {
        // |q1=0, q0=1⟩ → |q1=1, q0=1⟩
        let mut sv = Statevector::new(2);
        sv.apply_rx(0, PI);
        sv.apply_cx(0, 1);
        assert!(approx_eq(sv.probabilities()[0b11], 1.0));
    }

    #[test]
    fn test_cz_phase_only() {
        let mut sv = Statevector::new(2);
        sv.apply_ry(0, PI / 2.0);
        sv.apply_ry(1, PI / 2.0);
        sv.apply_cz(0, 1);
        for p in sv.probabilities() {
            assert!(approx_eq(p, 0.25));
        }
        // The phase shows up after rotating back.
        sv.apply_ry(0, -PI / 2.0);
        sv.apply_ry(1, -PI / 2.0);
        assert!(sv.probabilities()[0] < 0.9);
    }

    #[test]
    fn test_sample_deterministic() {
        let mut sv = Statevector::new(2);
        sv.apply_rx(1, PI);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let outcome = sv.sample(&mut rng);
            assert_eq!(outcome, 0b10);
            assert_eq!(qubit_bit(outcome, 0), 0);
            assert_eq!(qubit_bit(outcome, 1), 1);
        }
    }
}
