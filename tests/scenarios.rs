use approx::assert_relative_eq;
use ndstride::{
    add, arange, broadcast_shapes, concatenate, cumsum, flatten, from_scalar, from_vec, mean,
    roll, std, sum, var, DType, NdArray, NdError, Shape, Slice,
};
use proptest::prelude::*;

fn arange_i64(n: usize) -> NdArray {
    arange(0.0, n as f64, 1.0, DType::I64).unwrap()
}

#[test]
fn test_broadcast_four_dimensional_output() {
    let a = Shape::new(&[8, 1, 6, 1]);
    let b = Shape::new(&[7, 1, 5]);
    let bc = broadcast_shapes(&[&a, &b]).unwrap();
    assert_eq!(bc.dims(), &[8, 7, 6, 5]);
    assert_eq!(bc.operands[0].strides(), &[6, 0, 1, 0]);
    assert_eq!(bc.operands[1].strides(), &[0, 5, 0, 1]);
    let swapped = broadcast_shapes(&[&b, &a]).unwrap();
    assert_eq!(swapped.dims(), bc.dims());
}

#[test]
fn test_broadcast_to_never_shrinks() {
    let a = arange_i64(3);
    assert!(matches!(a.broadcast_to(&[1]), Err(NdError::ShapeMismatch { .. })));
    assert!(matches!(
        a.reshape(&[1, 3]).unwrap().broadcast_to(&[3]),
        Err(NdError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_reversed_view_broadcast_iterates_reversed() {
    let v = arange_i64(3).slice_str("::-1").unwrap();
    let b = v.broadcast_to(&[2, 3]).unwrap();
    let expected = vec![2, 1, 0, 2, 1, 0];
    assert_eq!(b.to_vec::<i64>(), expected);
    assert_eq!(flatten(&b).unwrap().to_vec::<i64>(), expected);
    assert_eq!(b.materialize().to_vec::<i64>(), expected);
    assert_eq!(b.to_string(), "[[2, 1, 0],\n [2, 1, 0]]");
    let coords: Vec<i64> = (0..2)
        .flat_map(|i| (0..3).map(move |j| (i, j)))
        .map(|(i, j)| b.get::<i64>(&[i, j]).unwrap())
        .collect();
    assert_eq!(coords, expected);
}

#[test]
fn test_column_broadcast_flattens_row_major() {
    let col = from_vec(vec![1i32, 2, 3], &[3, 1]).unwrap();
    let b = col.broadcast_to(&[3, 3]).unwrap();
    let expected = vec![1, 1, 1, 2, 2, 2, 3, 3, 3];
    assert_eq!(flatten(&b).unwrap().to_vec::<i32>(), expected);
    assert_eq!(
        concatenate(&[&b], 0).unwrap().to_vec::<i32>(),
        expected
    );
}

#[test]
fn test_sum_of_broadcast_column_over_axis0() {
    let col = from_vec(vec![1i64, 2, 3], &[3, 1]).unwrap();
    let b = col.broadcast_to(&[3, 3]).unwrap();
    assert_eq!(sum(&b, Some(0), false).unwrap().to_vec::<i64>(), vec![6, 6, 6]);
    assert_eq!(
        cumsum(&b, Some(0)).unwrap().to_vec::<i64>(),
        vec![1, 1, 1, 3, 3, 3, 6, 6, 6]
    );
    assert_eq!(mean(&b, Some(1), false).unwrap().to_vec::<f64>(), vec![1.0, 2.0, 3.0]);
    assert_eq!(std(&b, Some(1), 0, false).unwrap().to_vec::<f64>(), vec![0.0; 3]);
}

#[test]
fn test_moments_over_broadcast_axis() {
    let col = from_vec(vec![1.0f64, 2.0, 4.0], &[3, 1]).unwrap();
    let b = col.broadcast_to(&[3, 2]).unwrap();
    let m = mean(&b, Some(0), false).unwrap().to_vec::<f64>();
    let v = var(&b, Some(0), 1, false).unwrap().to_vec::<f64>();
    let s = std(&b, None, 0, false).unwrap().item().unwrap().as_f64();
    for j in 0..2 {
        assert_relative_eq!(m[j], 7.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(v[j], 7.0 / 3.0, epsilon = 1e-12);
    }
    assert_relative_eq!(s, (14.0f64 / 9.0).sqrt(), epsilon = 1e-12);
}

#[test]
fn test_sliced_then_broadcast_agrees_on_every_path() {
    let x = arange_i64(12).reshape(&[3, 4]).unwrap();
    let s = x.slice(&[Slice::ALL, Slice::range(1, 2)]).unwrap();
    let b = s.broadcast_to(&[3, 3]).unwrap();

    let by_coords: Vec<i64> = (0..3).map(|j| b.get::<i64>(&[2, j]).unwrap()).collect();
    assert_eq!(by_coords, vec![9, 9, 9]);
    assert_eq!(b.to_vec::<i64>()[6..], [9, 9, 9]);
    assert_eq!(flatten(&b).unwrap().to_vec::<i64>()[6..], [9, 9, 9]);
    assert_eq!(b.index_axis(0, 2).unwrap().to_vec::<i64>(), vec![9, 9, 9]);
    assert!(b.to_string().ends_with("[9, 9, 9]]"));
    assert_eq!(roll(&b, 1, Some(0)).unwrap().to_vec::<i64>()[..3], [9, 9, 9]);
    let plus = add(&b, &from_scalar(0i64)).unwrap();
    assert_eq!(plus.to_vec::<i64>()[6..], [9, 9, 9]);
}

#[test]
fn test_views_share_storage_until_dropped() {
    let a = arange_i64(6);
    let v = a.reshape(&[2, 3]).unwrap();
    let s = v.slice_str("1, ::2").unwrap();
    assert_eq!(a.storage().ref_count(), 3);
    s.write(&[1], 50i64).unwrap();
    assert_eq!(a.to_vec::<i64>(), vec![0, 1, 2, 3, 4, 50]);
    drop(s);
    drop(v);
    assert_eq!(a.storage().ref_count(), 1);
}

#[test]
fn test_broadcast_view_is_read_only_but_source_is_not() {
    let a = from_vec(vec![1.0f64, 2.0], &[2]).unwrap();
    let b = a.broadcast_to(&[2, 2]).unwrap();
    assert!(matches!(b.write(&[1, 1], 0.0), Err(NdError::ReadOnlyViolation)));
    a.write(&[1], 9.0).unwrap();
    assert_eq!(b.to_vec::<f64>(), vec![1.0, 9.0, 1.0, 9.0]);
    let copy = b.materialize();
    assert!(copy.is_writable());
    copy.write(&[0, 0], -1.0).unwrap();
    assert_eq!(a.to_vec::<f64>(), vec![1.0, 9.0]);
}

#[test]
fn test_zero_size_flows_through() {
    let e = NdArray::allocate(DType::F32, &[3, 0, 2]);
    assert_eq!(e.shape().iter().count(), 0);
    assert_eq!(flatten(&e).unwrap().size(), 0);
    assert_eq!(sum(&e, Some(1), false).unwrap().to_vec::<f64>(), vec![0.0; 6]);
    assert!(mean(&e, None, false).unwrap().item().unwrap().is_nan());
    assert_eq!(e.to_string(), "[]");
    assert_eq!(
        add(&e, &from_vec(vec![1.0f32, 2.0], &[2]).unwrap()).unwrap().dims(),
        &[3, 0, 2]
    );
}

/// Source dims plus a broadcast target: leading axes are prepended and unit
/// axes are stretched.
fn broadcast_case() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    (
        prop::collection::vec((1usize..4, 1usize..4), 0..=3),
        prop::collection::vec(1usize..3, 0..=2),
    )
        .prop_map(|(axes, lead)| {
            let src: Vec<usize> = axes.iter().map(|&(d, _)| d).collect();
            let mut target = lead;
            target.extend(axes.iter().map(|&(d, f)| if d == 1 { f } else { d }));
            (src, target)
        })
}

proptest! {
    #[test]
    fn prop_materialized_broadcast_matches_broadcast_values((src, target) in broadcast_case()) {
        let n: usize = src.iter().product();
        let x = from_vec((0..n as i64).collect::<Vec<i64>>(), &src).unwrap();
        let frozen = x.broadcast_to(&target).unwrap().materialize();
        prop_assert!(frozen.is_contiguous());
        prop_assert!(frozen.is_writable());
        prop_assert!(!frozen.shares_storage(&x));

        let lead = target.len() - src.len();
        let values = frozen.to_vec::<i64>();
        let total: usize = target.iter().product();
        prop_assert_eq!(values.len(), total);
        for (k, &got) in values.iter().enumerate() {
            // row-major coordinates of k in `target`, mapped back onto `src`
            let mut rest = k;
            let mut coords = vec![0usize; target.len()];
            for axis in (0..target.len()).rev() {
                coords[axis] = rest % target[axis];
                rest /= target[axis];
            }
            let mut expected = 0usize;
            for (i, &d) in src.iter().enumerate() {
                let c = if d == 1 { 0 } else { coords[lead + i] };
                expected = expected * d + c;
            }
            prop_assert_eq!(got, expected as i64);
        }
    }
}
