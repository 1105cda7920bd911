//! Exercises the assembly end to end on a binary methane/ethane mixture
//! described by the van der Waals model.

use mp_core::numeric::{nearly_equal, Tolerances};
use mp_core::units::{k, m3_per_mol, pa};
use mp_equil::{
    central_difference_jacobian, n_independent, EquilibriumError, MolarVolumeSpec,
    PhaseEquilibrium, PhaseFractionSpec, PhaseVariables, PressureSpec, Specification,
    TemperatureSpec,
};
use mp_model::VdwMixture;
use nalgebra::DVector;

const TC: [f64; 2] = [190.564, 305.32];
const PC: [f64; 2] = [4.5992e6, 4.8722e6];

fn model() -> VdwMixture {
    VdwMixture::from_critical(&TC, &PC).unwrap()
}

/// Liquid-ish phase 0, vapor-ish phase 1, near the 255 K / 4.6 MPa flash.
fn guess() -> PhaseVariables {
    PhaseVariables::new(
        255.0,
        vec![
            DVector::from_vec(vec![12_000.0, 3_000.0]),
            DVector::from_vec(vec![1_700.0, 400.0]),
        ],
        DVector::from_vec(vec![0.6, 0.4]),
    )
}

fn t_p_specs() -> Vec<Box<dyn Specification>> {
    vec![
        Box::new(TemperatureSpec::new(k(255.0))),
        Box::new(PressureSpec::new(pa(4.6e6))),
    ]
}

#[test]
fn reference_scenario_has_seven_unknowns() {
    let model = model();
    let zbulk = DVector::from_vec(vec![0.8, 0.2]);
    let init = guess();
    let mut system = PhaseEquilibrium::new(&model, &zbulk, &init, t_p_specs()).unwrap();

    assert_eq!(n_independent(2, 2), 7);
    assert_eq!(system.n_independent(), 7);

    let x = init.pack();
    let res = system.evaluate(&x).unwrap();
    assert_eq!(res.r.len(), 7);
    assert_eq!(res.j.nrows(), 7);
    assert_eq!(res.j.ncols(), 7);
    assert!(res.r.iter().all(|v| v.is_finite()));
    assert!(res.j.iter().all(|v| v.is_finite()));
}

#[test]
fn identical_phases_zero_the_equality_rows() {
    let model = model();
    let zbulk = DVector::from_vec(vec![0.8, 0.2]);
    let rho = DVector::from_vec(vec![5_000.0, 1_200.0]);
    let init = PhaseVariables::new(
        255.0,
        vec![rho.clone(), rho],
        DVector::from_vec(vec![0.5, 0.5]),
    );
    let mut system = PhaseEquilibrium::new(&model, &zbulk, &init, t_p_specs()).unwrap();

    let res = system.evaluate(&init.pack()).unwrap();
    // Two fugacity rows and one pressure row, all identical differences.
    assert_eq!(res.r[0], 0.0);
    assert_eq!(res.r[1], 0.0);
    assert_eq!(res.r[2], 0.0);
}

#[test]
fn consistent_split_zeroes_balance_and_normalization_rows() {
    let model = model();
    // Binary-friendly numbers so the weighted sum reproduces zbulk exactly.
    let zbulk = DVector::from_vec(vec![0.75, 0.25]);
    let init = PhaseVariables::new(
        250.0,
        vec![
            DVector::from_vec(vec![4_096.0 * 0.75, 4_096.0 * 0.25]),
            DVector::from_vec(vec![512.0 * 0.75, 512.0 * 0.25]),
        ],
        DVector::from_vec(vec![0.25, 0.75]),
    );
    let mut system = PhaseEquilibrium::new(&model, &zbulk, &init, t_p_specs()).unwrap();

    let res = system.evaluate(&init.pack()).unwrap();
    assert_eq!(res.r[3], 0.0, "mass balance row");
    assert_eq!(res.r[4], 0.0, "normalization row");
}

#[test]
fn analytic_jacobian_matches_central_differences() {
    let model = model();
    let zbulk = DVector::from_vec(vec![0.8, 0.2]);
    let init = guess();
    let mut system = PhaseEquilibrium::new(&model, &zbulk, &init, t_p_specs()).unwrap();

    let x = init.pack();
    let analytic = system.evaluate(&x).unwrap().j.clone();

    // Steps scaled to the variable magnitude; an absolute 1e-6 step is
    // noise-dominated at molar densities of order 1e4.
    let dx = x.map(|v| 1e-6 * v.abs().max(1.0));
    let numeric = central_difference_jacobian(&mut system, &x, &dx).unwrap();

    for i in 0..7 {
        let row_scale = (0..7)
            .map(|jc| analytic[(i, jc)].abs())
            .fold(0.0_f64, f64::max);
        assert!(row_scale > 0.0, "row {i} is identically zero");
        let tol = Tolerances {
            abs: 1e-6 * row_scale,
            rel: 1e-6,
        };
        for jc in 0..7 {
            assert!(
                nearly_equal(numeric[(i, jc)], analytic[(i, jc)], tol),
                "J[({i},{jc})]: analytic {} vs numeric {}",
                analytic[(i, jc)],
                numeric[(i, jc)]
            );
        }
    }
}

#[test]
fn specification_choice_touches_only_last_two_rows() {
    let model = model();
    let zbulk = DVector::from_vec(vec![0.8, 0.2]);
    let init = guess();
    let x = init.pack();

    let mut with_t_p = PhaseEquilibrium::new(&model, &zbulk, &init, t_p_specs()).unwrap();
    let res_t_p = with_t_p.evaluate(&x).unwrap();
    let (r1, j1) = (res_t_p.r.clone(), res_t_p.j.clone());

    let other_specs: Vec<Box<dyn Specification>> = vec![
        Box::new(PhaseFractionSpec::new(0.5, 0)),
        Box::new(MolarVolumeSpec::new(m3_per_mol(2.0e-4))),
    ];
    let mut with_beta_v = PhaseEquilibrium::new(&model, &zbulk, &init, other_specs).unwrap();
    let res_beta_v = with_beta_v.evaluate(&x).unwrap();

    for i in 0..5 {
        assert_eq!(r1[i], res_beta_v.r[i], "residual row {i}");
        for jc in 0..7 {
            assert_eq!(j1[(i, jc)], res_beta_v.j[(i, jc)], "J[({i},{jc})]");
        }
    }
    assert_ne!(r1[5], res_beta_v.r[5]);
    assert_ne!(r1[6], res_beta_v.r[6]);
}

#[test]
fn construction_rejects_bad_counts() {
    let model = model();
    let zbulk = DVector::from_vec(vec![0.8, 0.2]);
    let init = guess();

    let one_spec: Vec<Box<dyn Specification>> = vec![Box::new(TemperatureSpec::new(k(255.0)))];
    let err = PhaseEquilibrium::new(&model, &zbulk, &init, one_spec).err().unwrap();
    assert!(matches!(err, EquilibriumError::Construction { .. }));

    let three_specs: Vec<Box<dyn Specification>> = vec![
        Box::new(TemperatureSpec::new(k(255.0))),
        Box::new(PressureSpec::new(pa(4.6e6))),
        Box::new(PhaseFractionSpec::new(0.5, 0)),
    ];
    let err = PhaseEquilibrium::new(&model, &zbulk, &init, three_specs).err().unwrap();
    assert!(matches!(err, EquilibriumError::Construction { .. }));

    let ragged = PhaseVariables::new(
        255.0,
        vec![DVector::from_vec(vec![12_000.0, 3_000.0])],
        DVector::from_vec(vec![0.6, 0.4]),
    );
    let err = PhaseEquilibrium::new(&model, &zbulk, &ragged, t_p_specs()).err().unwrap();
    assert!(matches!(err, EquilibriumError::Construction { .. }));

    let zbad = DVector::from_vec(vec![0.5, 0.3, 0.2]);
    let err = PhaseEquilibrium::new(&model, &zbad, &guess(), t_p_specs()).err().unwrap();
    assert!(matches!(err, EquilibriumError::Construction { .. }));

    // A specification addressing a phase the system does not have is caught
    // at construction, not as a panic during evaluation.
    let oob_phase: Vec<Box<dyn Specification>> = vec![
        Box::new(TemperatureSpec::new(k(255.0))),
        Box::new(PhaseFractionSpec::new(0.5, 2)),
    ];
    let err = PhaseEquilibrium::new(&model, &zbulk, &guess(), oob_phase).err().unwrap();
    assert!(matches!(err, EquilibriumError::Construction { .. }));
}

#[test]
fn evaluate_rejects_wrong_length() {
    let model = model();
    let zbulk = DVector::from_vec(vec![0.8, 0.2]);
    let init = guess();
    let mut system = PhaseEquilibrium::new(&model, &zbulk, &init, t_p_specs()).unwrap();

    let err = system.evaluate(&DVector::zeros(6)).err().unwrap();
    assert!(matches!(
        err,
        EquilibriumError::InputSize {
            expected: 7,
            actual: 6
        }
    ));
}

#[test]
fn buffers_are_overwritten_by_the_next_call() {
    let model = model();
    let zbulk = DVector::from_vec(vec![0.8, 0.2]);
    let init = guess();
    let mut system = PhaseEquilibrium::new(&model, &zbulk, &init, t_p_specs()).unwrap();

    let x = init.pack();
    let r_first = system.evaluate(&x).unwrap().r.clone();

    let mut warmer = x.clone();
    warmer[0] += 5.0;
    let r_second = system.evaluate(&warmer).unwrap().r.clone();

    // The temperature specification row tracks the new trial point.
    assert_eq!(r_first[5], 0.0);
    assert_eq!(r_second[5], 5.0);
}
