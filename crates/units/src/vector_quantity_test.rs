mod tests {
    use approx::assert_relative_eq;

    use crate::{Dimension, Quantity, Unit, UnitError, VectorQuantity};

    #[test]
    fn test_values_in_converts() {
        let v = VectorQuantity::new(&[1.0, 2.0, 3.0], &Unit::kpc());
        let pc = v.values_in(&Unit::parse("pc").unwrap()).unwrap();
        assert_relative_eq!(pc[2], 3000.0, max_relative = 1e-12);
        assert_eq!(v.len(), 3);
        assert_eq!(v.dimension(), Dimension::LENGTH);
    }

    #[test]
    fn test_values_in_rejects_other_dimension() {
        let v = VectorQuantity::new(&[1.0], &Unit::kpc());
        assert!(matches!(
            v.values_in(&Unit::kms()),
            Err(UnitError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_deserialize_from_mapping() {
        let v: VectorQuantity =
            serde_json::from_str(r#"{"value": [0.0, 5.0, 0.0], "unit": "kms"}"#).unwrap();
        assert_relative_eq!(v.values_in(&Unit::kms()).unwrap()[1], 5.0);
    }

    #[test]
    fn test_collect_checks_dimensions() {
        let ok = VectorQuantity::from_quantities([
            Quantity::new(1.0, &Unit::kpc()),
            Quantity::new(500.0, &Unit::parse("pc").unwrap()),
        ])
        .unwrap();
        assert_relative_eq!(ok.get(1).unwrap().value_in(&Unit::kpc()).unwrap(), 0.5);

        let mixed = VectorQuantity::from_quantities([
            Quantity::new(1.0, &Unit::kpc()),
            Quantity::new(1.0, &Unit::myr()),
        ]);
        assert!(mixed.is_err());
    }
}
