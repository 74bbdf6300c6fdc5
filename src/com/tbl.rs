use super::*;

lazy_static! {
    /* z-order to raster partition index of a (1 << depth) square grid, per depth */
    pub(crate) static ref hevc_tbl_zscan_to_raster: Vec<Box<[u32]>> =
        (0..=MAX_CU_DEPTH).map(init_zscan_to_raster).collect();
    pub(crate) static ref hevc_tbl_raster_to_zscan: Vec<Box<[u32]>> = hevc_tbl_zscan_to_raster
        .iter()
        .map(|z2r| {
            let mut r2z = vec![0u32; z2r.len()].into_boxed_slice();
            for (z, &r) in z2r.iter().enumerate() {
                r2z[r as usize] = z as u32;
            }
            r2z
        })
        .collect();
}

fn init_zscan_to_raster(depth: usize) -> Box<[u32]> {
    let num = 1usize << (2 * depth);
    let width = 1usize << depth;
    let mut tbl = vec![0u32; num].into_boxed_slice();
    for z in 0..num {
        let (mut x, mut y) = (0, 0);
        for b in 0..depth {
            x |= ((z >> (2 * b)) & 1) << b;
            y |= ((z >> (2 * b + 1)) & 1) << b;
        }
        tbl[z] = (y * width + x) as u32;
    }
    tbl
}

#[inline]
pub(crate) fn zscan_to_raster(max_depth: u8, idx: usize) -> usize {
    hevc_tbl_zscan_to_raster[max_depth as usize][idx] as usize
}

#[inline]
pub(crate) fn raster_to_zscan(max_depth: u8, idx: usize) -> usize {
    hevc_tbl_raster_to_zscan[max_depth as usize][idx] as usize
}

/* pel offset of a z-order partition inside its CTU */
#[inline]
pub(crate) fn zscan_to_pel(max_depth: u8, unit: u32, idx: usize) -> (u32, u32) {
    let raster = zscan_to_raster(max_depth, idx);
    let width = 1usize << max_depth;
    (
        (raster % width) as u32 * unit,
        (raster / width) as u32 * unit,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn zscan_of_4x4_grid() {
        let z2r: Vec<u32> = hevc_tbl_zscan_to_raster[2].to_vec();
        assert_eq!(
            z2r,
            vec![0, 1, 4, 5, 2, 3, 6, 7, 8, 9, 12, 13, 10, 11, 14, 15]
        );
        for z in 0..16 {
            assert_eq!(raster_to_zscan(2, zscan_to_raster(2, z)), z);
        }
    }

    #[test]
    fn pel_position_of_last_partition() {
        assert_eq!(zscan_to_pel(4, 4, 255), (60, 60));
        assert_eq!(zscan_to_pel(4, 4, 64), (32, 0));
        assert_eq!(zscan_to_pel(4, 4, 128), (0, 32));
    }
}
