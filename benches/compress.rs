use criterion::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use rhevc::api::*;
use rhevc::com::*;

criterion_group!(compress, bench_compress_cu_p_slice, bench_compress_cu_i_slice);

/* zero motion from a fixed reference, DC intra */
struct ZeroMotionSearch {
    refp: HevcYuv,
}

fn dc_fill(org: &HevcYuv, pred: &mut HevcYuv) {
    for comp in 0..org.num_comps() {
        let plane = org.plane(comp);
        let dc = plane.iter().map(|&v| v as i64).sum::<i64>() / plane.len().max(1) as i64;
        pred.fill(comp, dc as pel);
    }
}

impl PredSearch for ZeroMotionSearch {
    fn merge_candidates(&mut self, _cu: &HevcCUData, _pic: &HevcPic) -> Vec<HevcMergeCand> {
        vec![HevcMergeCand {
            inter_dir: 1,
            mv_field: [HevcMvField::new(HevcMv::default(), 0), HevcMvField::default()],
        }]
    }

    fn motion_compensation(&mut self, cu: &HevcCUData, _pic: &HevcPic, pred: &mut HevcYuv) {
        pred.copy_from_pic_yuv(&self.refp, cu.cu_pel_x() as usize, cu.cu_pel_y() as usize);
    }

    fn pred_inter_search(
        &mut self,
        cu: &mut HevcCUData,
        pic: &HevcPic,
        _org: &HevcYuv,
        pred: &mut HevcYuv,
        use_mrg: bool,
    ) -> bool {
        if use_mrg {
            return false;
        }
        let depth = cu.depth(0);
        cu.set_inter_dir_sub_parts(1, 0, 0, depth);
        cu.set_all_mv_field(HevcMvField::new(HevcMv::default(), 0), REF_PIC_LIST_0, 0, 0, depth);
        self.motion_compensation(cu, pic, pred);
        true
    }

    fn est_intra_pred(
        &mut self,
        cu: &mut HevcCUData,
        _pic: &HevcPic,
        org: &HevcYuv,
        pred: &mut HevcYuv,
        _resi: &mut HevcYuv,
        reco: &mut HevcYuv,
    ) -> u64 {
        let depth = cu.depth(0);
        dc_fill(org, pred);
        cu.set_intra_dir_sub_parts(0, DC_IDX, 0, depth);
        cu.set_intra_dir_sub_parts(1, DM_CHROMA_IDX, 0, depth);
        for comp in 0..org.num_comps() {
            cu.set_cbf_sub_parts(0, comp, 0, depth);
        }
        *reco = pred.clone();
        org.ssd(pred)
    }

    fn pred_intra_bc_search(
        &mut self,
        _cu: &mut HevcCUData,
        _pic: &HevcPic,
        _org: &HevcYuv,
        _pred: &mut HevcYuv,
        _search_1d: bool,
    ) -> bool {
        false
    }
}

/* residual dropped, reconstruction is the prediction */
struct PredOnlyResidual;

impl ResidualCoder for PredOnlyResidual {
    fn encode_res_and_calc_rd_inter_cu(
        &mut self,
        cu: &mut HevcCUData,
        org: &HevcYuv,
        pred: &HevcYuv,
        _resi: &mut HevcYuv,
        reco: &mut HevcYuv,
        _skip_residual: bool,
    ) -> u64 {
        let depth = cu.depth(0);
        for comp in 0..org.num_comps() {
            cu.set_cbf_sub_parts(0, comp, 0, depth);
        }
        *reco = pred.clone();
        org.ssd(pred)
    }
}

fn random_yuv(ra: &mut ChaChaRng, w: usize, h: usize) -> HevcYuv {
    let mut yuv = HevcYuv::new(w, h, ChromaSampling::Cs420);
    for comp in 0..yuv.num_comps() {
        for v in yuv.plane_mut(comp).iter_mut() {
            let s: u8 = ra.gen();
            *v = s as pel;
        }
    }
    yuv
}

fn bench_compress(c: &mut Criterion, name: &str, slice_type: SliceType) {
    let mut ra = ChaChaRng::from_seed([0; 32]);
    let mut sps = HevcSps::new(64, 64, 64, 4);
    sps.add_cu_depth = 1;
    let slice = HevcSlice::new(&sps, slice_type, 32, 57.0);

    let refp = random_yuv(&mut ra, 64, 64);
    let mut pic = HevcPic::new(&sps);
    pic.org = random_yuv(&mut ra, 64, 64);

    let mut cu = HevceCu::new(
        &sps,
        &HevcPps::default(),
        &EncoderConfig::new(),
        &ToolProfile::hm(),
        ZeroMotionSearch { refp },
        PredOnlyResidual,
        HevceSbac::new_estimator(&sps),
    )
    .unwrap();

    c.bench_function(name, |b| {
        b.iter(|| {
            let _ = black_box(cu.compress_cu(&mut pic, &slice, 0));
        })
    });
}

fn bench_compress_cu_p_slice(c: &mut Criterion) {
    bench_compress(c, "compress_cu_p_slice", SliceType::P_SLICE);
}

fn bench_compress_cu_i_slice(c: &mut Criterion) {
    bench_compress(c, "compress_cu_i_slice", SliceType::I_SLICE);
}
