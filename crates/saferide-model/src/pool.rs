use anyhow::Result;
use candle_core::{DType, Tensor};

/// Mean of `hidden` [B,T,H] over positions where `ids` [B,T] is not padding.
/// Rows with no real token come out as zeros.
pub fn masked_mean(hidden: &Tensor, ids: &Tensor, pad_id: u32) -> Result<Tensor> {
    let dims = hidden.dims();
    anyhow::ensure!(dims.len() == 3, "hidden shape must be [B,T,H], got {:?}", dims);
    let batch = dims[0];
    let hidden_dim = dims[2];

    let mask = ids.ne(pad_id)?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?;
    let mask_broadcast = mask_3d.broadcast_as(hidden.shape())?;
    let masked = (hidden * &mask_broadcast)?;
    let sum = masked.sum(1)?;
    let lengths = mask.sum(1)?.unsqueeze(1)?.to_dtype(DType::F32)?.maximum(1f32)?.to_dtype(sum.dtype())?;
    let mean = sum.broadcast_div(&lengths)?;
    anyhow::ensure!(mean.dims() == [batch, hidden_dim], "pooled shape mismatch: {:?}", mean.dims());
    Ok(mean)
}
