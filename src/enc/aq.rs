use crate::api::*;
use crate::com::*;

/* activity of every adaptation unit of one layer */
#[derive(Debug, Clone, Default)]
struct HevceAqLayer {
    unit_width: u32,
    unit_height: u32,
    units_in_width: usize,
    activity: Vec<f64>,
    avg_activity: f64,
}

impl HevceAqLayer {
    fn new(sps: &HevcSps, aq_depth: u8) -> Self {
        let unit_width = (sps.max_cu_width >> aq_depth).max(1);
        let unit_height = (sps.max_cu_height >> aq_depth).max(1);
        let units_in_width = ((sps.pic_width + unit_width - 1) / unit_width) as usize;
        let units_in_height = ((sps.pic_height + unit_height - 1) / unit_height) as usize;
        HevceAqLayer {
            unit_width,
            unit_height,
            units_in_width,
            activity: vec![0.0; units_in_width * units_in_height],
            avg_activity: 0.0,
        }
    }

    /* 1 + the smallest luma variance among the four quarters of each unit */
    fn analyze(&mut self, org: &HevcYuv) {
        let (pw, ph) = (org.width(Y_C), org.height(Y_C));
        let plane = org.plane(Y_C);
        let (uw, uh) = (self.unit_width as usize, self.unit_height as usize);
        let units_in_height = self.activity.len() / self.units_in_width.max(1);

        let mut sum_act = 0.0;
        for uy in 0..units_in_height {
            for ux in 0..self.units_in_width {
                let (x0, y0) = (ux * uw, uy * uh);
                let cw = uw.min(pw - x0);
                let ch = uh.min(ph - y0);
                let (hw, hh) = ((cw >> 1).max(1), (ch >> 1).max(1));

                let mut sum = [0u64; 4];
                let mut sum_sq = [0u64; 4];
                let mut cnt = [0u64; 4];
                for y in 0..ch {
                    let row = &plane[(y0 + y) * pw + x0..(y0 + y) * pw + x0 + cw];
                    let qy = (y >= hh) as usize;
                    for (x, &v) in row.iter().enumerate() {
                        let q = 2 * qy + (x >= hw) as usize;
                        let v = v as u64;
                        sum[q] += v;
                        sum_sq[q] += v * v;
                        cnt[q] += 1;
                    }
                }

                let min_var = (0..4)
                    .filter(|&q| cnt[q] > 0)
                    .map(|q| {
                        let n = cnt[q] as f64;
                        let avg = sum[q] as f64 / n;
                        sum_sq[q] as f64 / n - avg * avg
                    })
                    .fold(f64::MAX, f64::min);
                let act = 1.0 + if min_var == f64::MAX { 0.0 } else { min_var };
                self.activity[uy * self.units_in_width + ux] = act;
                sum_act += act;
            }
        }
        self.avg_activity = sum_act / self.activity.len().max(1) as f64;
    }
}

/// Per layer luma activity statistics driving the adaptive QP offsets.
#[derive(Debug, Clone, Default)]
pub struct HevceAqLayers {
    layers: Vec<HevceAqLayer>,
}

impl HevceAqLayers {
    /// One layer per AQ depth, layer `d` working on units of the CTU size `>> d`.
    pub fn new(sps: &HevcSps, max_aq_depth: u8) -> Self {
        HevceAqLayers {
            layers: (0..max_aq_depth.max(1))
                .map(|d| HevceAqLayer::new(sps, d))
                .collect(),
        }
    }

    /// Measure the activities of a source picture.
    pub fn analyze(&mut self, org: &HevcYuv) {
        for layer in &mut self.layers {
            layer.analyze(org);
        }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    fn layer(&self, aq_depth: u8) -> &HevceAqLayer {
        &self.layers[(aq_depth as usize).min(self.layers.len() - 1)]
    }
}

impl AdaptiveQpLayer for HevceAqLayers {
    fn unit_size(&self, aq_depth: u8) -> (u32, u32) {
        let l = self.layer(aq_depth);
        (l.unit_width, l.unit_height)
    }

    fn num_units_in_width(&self, aq_depth: u8) -> usize {
        self.layer(aq_depth).units_in_width
    }

    fn activity(&self, aq_depth: u8, unit_idx: usize) -> f64 {
        self.layer(aq_depth).activity[unit_idx]
    }

    fn avg_activity(&self, aq_depth: u8) -> f64 {
        self.layer(aq_depth).avg_activity
    }
}
