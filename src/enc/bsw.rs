use crate::com::tracer::*;

/* bit writer behind the arithmetic coder */
#[derive(Default)]
pub(crate) struct HevceBsw {
    /* 32-bit staging word */
    code: u32,
    /* bits still free in code */
    leftbits: isize,
    /* bytes sunk so far */
    data: Vec<u8>,
    pub(crate) tracer: Option<Tracer>,
}

impl HevceBsw {
    pub(crate) fn new() -> Self {
        HevceBsw {
            code: 0,
            leftbits: 32,
            data: vec![],
            tracer: OPEN_TRACE(),
        }
    }

    #[inline]
    pub(crate) fn IS_BYTE_ALIGN(&self) -> bool {
        (self.leftbits & 0x7) == 0
    }

    /* bits written, staged ones included */
    #[inline]
    pub(crate) fn num_bits(&self) -> u32 {
        (self.data.len() as u32) * 8 + (32 - self.leftbits) as u32
    }

    #[inline]
    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn sink_bytes(&self) -> u32 {
        ((32 - self.leftbits + 7) >> 3) as u32
    }

    pub(crate) fn flush(&mut self) {
        let mut bytes = self.sink_bytes();
        while bytes != 0 {
            self.data.push(((self.code >> 24) & 0xFF) as u8);
            self.code <<= 8;
            bytes -= 1;
        }
        self.code = 0;
        self.leftbits = 32;
    }

    pub(crate) fn init(&mut self) {
        self.code = 0;
        self.leftbits = 32;
        self.data.clear();
    }

    pub(crate) fn write1(&mut self, val: u32, name: Option<&str>) {
        if let Some(name) = name {
            HEVC_TRACE(&mut self.tracer, name);
            HEVC_TRACE(&mut self.tracer, " ");
            HEVC_TRACE(&mut self.tracer, val);
            HEVC_TRACE(&mut self.tracer, " \n");
        }

        self.leftbits -= 1;
        self.code |= (val & 0x1) << self.leftbits;

        if self.leftbits == 0 {
            self.flush();
        }
    }

    pub(crate) fn write(&mut self, mut val: u32, len: isize, name: Option<&str>) {
        debug_assert!(len > 0 && len <= 32);

        if let Some(name) = name {
            HEVC_TRACE(&mut self.tracer, name);
            HEVC_TRACE(&mut self.tracer, " ");
            HEVC_TRACE(&mut self.tracer, val);
            HEVC_TRACE(&mut self.tracer, " \n");
        }

        let leftbits = self.leftbits;
        if len < 32 {
            val &= (1u32 << len) - 1;
        }
        val = if len == 32 { val } else { val << (32 - len) };
        self.code |= val >> (32 - leftbits);

        if len < leftbits {
            self.leftbits -= len;
        } else {
            self.leftbits = 0;
            self.flush();
            self.code = if leftbits < 32 { val << leftbits } else { 0 };
            self.leftbits = 32 - (len - leftbits);
        }
    }
}
