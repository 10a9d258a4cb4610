use approx::assert_relative_eq;
use nbody::{Particle, ParticleSet};
use units::{Dimension, Unit, UnitError};

use crate::expression::{
    BinaryOp, Evaluated, Expr, Expression, ExpressionError, Variables, particle_variables,
};

fn two_particles() -> ParticleSet {
    vec![
        Particle::new(2.0, [0.0, 3.0, 0.0], [1.0, 0.0, 0.0]),
        Particle::new(4.0, [1.0, 4.0, 0.0], [0.0, 2.0, 0.0]),
    ]
    .into()
}

#[test]
fn test_precedence() {
    let expr = Expression::parse("1 + 2 * 3 ^ 2").unwrap();
    let value = expr.evaluate(&Variables::new()).unwrap();
    assert!(value.scalar);
    assert_relative_eq!(value.values[0], 19.0);
}

#[test]
fn test_power_is_right_associative() {
    let value = Expression::parse("2 ^ 3 ^ 2")
        .unwrap()
        .evaluate(&Variables::new())
        .unwrap();
    assert_relative_eq!(value.values[0], 512.0);

    let value = Expression::parse("2 ** -1")
        .unwrap()
        .evaluate(&Variables::new())
        .unwrap();
    assert_relative_eq!(value.values[0], 0.5);
}

#[test]
fn test_unary_minus_binds_looser_than_power() {
    let expr = Expression::parse("-x^2").unwrap();
    assert!(matches!(expr.root(), Expr::Neg(_)));

    let value = Expression::parse("-(2)^2")
        .unwrap()
        .evaluate(&Variables::new())
        .unwrap();
    assert_relative_eq!(value.values[0], -4.0);
}

#[test]
fn test_left_associative_subtraction() {
    let expr = Expression::parse("10 - 4 - 3").unwrap();
    let Expr::Binary { op, .. } = expr.root() else {
        panic!("expected a binary expression");
    };
    assert_eq!(*op, BinaryOp::Sub);
    assert_relative_eq!(expr.evaluate(&Variables::new()).unwrap().values[0], 3.0);
}

#[test]
fn test_scientific_literals() {
    let value = Expression::parse("1.5e3 + .5 + 2E-1")
        .unwrap()
        .evaluate(&Variables::new())
        .unwrap();
    assert_relative_eq!(value.values[0], 1500.7, max_relative = 1e-12);
}

#[test]
fn test_particle_columns_keep_units() {
    let vars = particle_variables(&two_particles());
    let r = Expression::parse("sqrt(x^2 + y^2)")
        .unwrap()
        .evaluate(&vars)
        .unwrap();

    assert_eq!(r.dim, Dimension::LENGTH);
    let r = r.values_in(&Unit::kpc()).unwrap();
    assert_relative_eq!(r[0], 3.0, max_relative = 1e-12);
    assert_relative_eq!(r[1], 17.0_f64.sqrt(), max_relative = 1e-12);
}

#[test]
fn test_kinetic_energy_dimension() {
    let vars = particle_variables(&two_particles());
    let energy = Expression::parse("(vx^2 + vy^2 + vz^2) * m / 2")
        .unwrap()
        .evaluate(&vars)
        .unwrap();

    assert_eq!(energy.dim, Dimension::ENERGY);
    let joules = energy.values_in(&Unit::parse("J").unwrap()).unwrap();
    let expected = 0.5 * 2.0 * units::SOLAR_MASS_KG * 1.0e6;
    assert_relative_eq!(joules[0], expected, max_relative = 1e-12);
}

#[test]
fn test_adding_length_to_velocity_fails() {
    let vars = particle_variables(&two_particles());
    let result = Expression::parse("x + vx").unwrap().evaluate(&vars);
    assert!(matches!(
        result,
        Err(ExpressionError::Unit(UnitError::Incompatible { .. }))
    ));
}

#[test]
fn test_transcendental_needs_dimensionless_argument() {
    let vars = particle_variables(&two_particles());
    assert!(Expression::parse("log(x)").unwrap().evaluate(&vars).is_err());

    let ratio = Expression::parse("cos(x / y)")
        .unwrap()
        .evaluate(&vars)
        .unwrap();
    assert_relative_eq!(ratio.values[0], 1.0);
}

#[test]
fn test_fractional_power_of_dimensioned_value() {
    let mut vars = Variables::new();
    vars.insert(
        "a".into(),
        Evaluated::column([4.0], &Unit::parse("kpc^2").unwrap()),
    );
    let root = Expression::parse("a^0.5").unwrap().evaluate(&vars).unwrap();
    assert_eq!(root.dim, Dimension::LENGTH);
    assert_relative_eq!(
        root.values_in(&Unit::kpc()).unwrap()[0],
        2.0,
        max_relative = 1e-12
    );

    let vars = particle_variables(&two_particles());
    assert!(matches!(
        Expression::parse("x^0.3").unwrap().evaluate(&vars),
        Err(ExpressionError::InvalidExponent(_))
    ));
}

#[test]
fn test_length_mismatch() {
    let mut vars = Variables::new();
    vars.insert("a".into(), Evaluated::array(vec![1.0, 2.0], Dimension::NONE));
    vars.insert("b".into(), Evaluated::array(vec![1.0], Dimension::NONE));
    assert!(matches!(
        Expression::parse("a + b").unwrap().evaluate(&vars),
        Err(ExpressionError::LengthMismatch { left: 2, right: 1 })
    ));
}

#[test]
fn test_unknown_names() {
    let vars = particle_variables(&two_particles());
    assert!(matches!(
        Expression::parse("q + 1").unwrap().evaluate(&vars),
        Err(ExpressionError::UnknownVariable(name)) if name == "q"
    ));
    assert!(matches!(
        Expression::parse("tanh(x)"),
        Err(ExpressionError::UnknownFunction(_))
    ));
}

#[test]
fn test_syntax_errors() {
    for source in ["", "1 +", "(x", "x)", "2 $ 3", "x y"] {
        assert!(
            matches!(Expression::parse(source), Err(ExpressionError::Syntax { .. })),
            "`{source}` should not parse"
        );
    }
}

#[test]
fn test_empty_particle_set_gives_empty_arrays() {
    let vars = particle_variables(&ParticleSet::new());
    let value = Expression::parse("x * 2").unwrap().evaluate(&vars).unwrap();
    assert!(value.values.is_empty());
    assert!(!value.scalar);
}
